use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initializes `tracing` logging with options from the environment variable given in the `env`
/// parameter, e.g. `MARIADB_MANIFEST_PROVIDER_LOG=debug`.
///
/// If the variable is not set, the maximum log level is INFO. Logs are written to stderr, as
/// stdout carries the rendered manifests.
pub fn initialize_logging(env: &str) {
    let filter = EnvFilter::try_from_env(env)
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    Registry::default().with(filter).with(fmt).init();
}
