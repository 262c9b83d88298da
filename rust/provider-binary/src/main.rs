use clap::{crate_description, Parser};
use snafu::{ResultExt, Snafu};

use crate::cli::Opts;

mod cli;
mod crd;
mod data_source;
mod logging;
mod manifest;
mod metadata;
mod validation;

mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

const LOG_ENV_VAR: &str = "MARIADB_MANIFEST_PROVIDER_LOG";

#[derive(Snafu, Debug)]
enum Error {
    #[snafu(display("failed to run command"))]
    Run { source: cli::Error },
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let opts = Opts::parse();

    logging::initialize_logging(LOG_ENV_VAR);
    tracing::info!(
        version = built_info::PKG_VERSION,
        git_version = built_info::GIT_VERSION.unwrap_or("unknown"),
        target = built_info::TARGET,
        built_time = built_info::BUILT_TIME_UTC,
        rustc_version = built_info::RUSTC_VERSION,
        "starting {}",
        crate_description!()
    );

    opts.cmd.run().context(RunSnafu)
}
