use std::{
    io::{Read, Write},
    path::PathBuf,
};

use serde::Deserialize;
use snafu::{OptionExt, ResultExt, Snafu};

use crate::data_source::{self, DataSource};

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(display("unknown data source {name:?}, run `list` to see the supported ones"))]
    UnknownDataSource { name: String },

    #[snafu(display("failed to read configuration from {path:?}"))]
    ReadConfigFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to read configuration from stdin"))]
    ReadStdin { source: std::io::Error },

    #[snafu(display("failed to parse YAML document {index}"))]
    ParseDocument {
        source: serde_yaml::Error,
        index: usize,
    },

    #[snafu(display("failed to serialize YAML document {index}"))]
    SerializeDocument {
        source: serde_yaml::Error,
        index: usize,
    },

    #[snafu(display("failed to read data source from document {index}"))]
    ReadDataSource {
        source: data_source::Error,
        index: usize,
    },

    #[snafu(display("failed to describe data source"))]
    DescribeDataSource { source: data_source::Error },

    #[snafu(display("failed to serialize output as YAML"))]
    SerializeYaml { source: serde_yaml::Error },

    #[snafu(display("failed to serialize output as JSON"))]
    SerializeJson { source: serde_json::Error },

    #[snafu(display("failed to write output to {path:?}"))]
    WriteOutputFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to write output to stdout"))]
    WriteStdout { source: std::io::Error },
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(clap::Parser, Debug)]
#[command(about, author, version)]
pub struct Opts {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// List all supported data sources.
    List,

    /// Print the configuration schema of a data source.
    Schema {
        /// Type name or kind of the data source, e.g. `mariadb`.
        data_source: String,

        /// Print JSON instead of YAML.
        #[arg(long)]
        json: bool,
    },

    /// Render manifests from one or more configuration documents.
    Render(RenderArgs),
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Type name or kind of the data source, e.g. `mariadb`.
    pub data_source: String,

    /// File containing YAML (or JSON) configuration documents. Reads stdin if not set.
    #[arg(long, env = "MARIADB_MANIFEST_PROVIDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the complete data source state as JSON instead of the manifests.
    #[arg(long)]
    pub state: bool,

    /// Write to this file instead of stdout.
    #[arg(long, env = "MARIADB_MANIFEST_PROVIDER_OUTPUT")]
    pub output: Option<PathBuf>,
}

impl Command {
    pub fn run(self) -> Result<()> {
        match self {
            Command::List => write_output(None, &list()),
            Command::Schema { data_source, json } => {
                let data_source = find_data_source(&data_source)?;
                write_output(None, &schema(data_source.as_ref(), json)?)
            }
            Command::Render(args) => {
                let data_source = find_data_source(&args.data_source)?;
                let input = read_input(args.config.as_ref())?;
                let output = render(data_source.as_ref(), &input, args.state)?;
                write_output(args.output.as_ref(), &output)
            }
        }
    }
}

fn find_data_source(name: &str) -> Result<Box<dyn DataSource>> {
    data_source::find(name).context(UnknownDataSourceSnafu { name })
}

fn list() -> String {
    data_source::data_sources()
        .iter()
        .map(|data_source| format!("{}\t{}\n", data_source.type_name(), data_source.kind()))
        .collect()
}

fn schema(data_source: &dyn DataSource, json: bool) -> Result<String> {
    let schema = data_source.schema().context(DescribeDataSourceSnafu)?;
    if json {
        serde_json::to_string_pretty(&schema)
            .map(|json| json + "\n")
            .context(SerializeJsonSnafu)
    } else {
        serde_yaml::to_string(&schema).context(SerializeYamlSnafu)
    }
}

/// Reads every document of `input` with `data_source`.
///
/// Renders the manifests separated by `---`, or with `state` a JSON array holding the state of
/// every document. Empty documents are skipped.
fn render(data_source: &dyn DataSource, input: &str, state: bool) -> Result<String> {
    let mut states = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(input).enumerate() {
        let config =
            serde_yaml::Value::deserialize(document).context(ParseDocumentSnafu { index })?;
        if config.is_null() {
            tracing::debug!(index, "skipping empty document");
            continue;
        }

        // Each document is handed over as text, see `DataSource::read`.
        let document =
            serde_yaml::to_string(&config).context(SerializeDocumentSnafu { index })?;
        let data_source_state = data_source
            .read(&document)
            .context(ReadDataSourceSnafu { index })?;
        tracing::info!(
            id = %data_source_state.id,
            kind = data_source.kind(),
            "rendered manifest"
        );
        states.push(data_source_state);
    }
    if states.is_empty() {
        tracing::warn!("input contains no configuration documents");
    }

    if state {
        serde_json::to_string_pretty(&states)
            .map(|json| json + "\n")
            .context(SerializeJsonSnafu)
    } else {
        Ok(states
            .into_iter()
            .map(|state| state.yaml)
            .collect::<Vec<_>>()
            .join("---\n"))
    }
}

fn read_input(config: Option<&PathBuf>) -> Result<String> {
    match config {
        Some(path) => std::fs::read_to_string(path).context(ReadConfigFileSnafu { path }),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context(ReadStdinSnafu)?;
            Ok(input)
        }
    }
}

fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content).context(WriteOutputFileSnafu { path }),
        None => std::io::stdout()
            .lock()
            .write_all(content.as_bytes())
            .context(WriteStdoutSnafu),
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use indoc::indoc;
    use rstest::rstest;

    use super::*;
    use crate::crd::ResourceKind;

    #[test]
    fn test_opts_are_valid() {
        Opts::command().debug_assert();
    }

    #[rstest]
    #[case(&["provider", "list"])]
    #[case(&["provider", "schema", "mariadb", "--json"])]
    #[case(&["provider", "render", "grant", "--config", "grant.yaml", "--state"])]
    fn test_parse_args(#[case] args: &[&str]) {
        Opts::try_parse_from(args).unwrap();
    }

    #[test]
    fn test_list() {
        let list = list();
        assert_eq!(list.lines().count(), 8);
        assert!(list.contains("k8s_k8s_mariadb_com_maria_db_v1alpha1_manifest\tMariaDB\n"));
    }

    #[test]
    fn test_schema_formats() {
        let data_source = ResourceKind::Database.data_source();

        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&schema(data_source.as_ref(), false).unwrap()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&schema(data_source.as_ref(), true).unwrap()).unwrap();

        assert_eq!(
            yaml["typeName"].as_str(),
            Some("k8s_k8s_mariadb_com_database_v1alpha1_manifest")
        );
        assert_eq!(json["typeName"], yaml["typeName"].as_str().unwrap());
    }

    #[test]
    fn test_render_multiple_documents() {
        let input = indoc! {r#"
            metadata:
              name: app
              namespace: default
            spec:
              mariaDbRef:
                name: mariadb
            ---
            ---
            metadata:
              name: reporting
              namespace: default
        "#};

        let output = render(ResourceKind::Database.data_source().as_ref(), input, false).unwrap();
        assert_eq!(
            output,
            indoc! {r#"
                apiVersion: k8s.mariadb.com/v1alpha1
                kind: Database
                metadata:
                  name: app
                  namespace: default
                spec:
                  mariaDbRef:
                    name: mariadb
                ---
                apiVersion: k8s.mariadb.com/v1alpha1
                kind: Database
                metadata:
                  name: reporting
                  namespace: default
            "#}
        );
    }

    #[test]
    fn test_render_integer_quantities() {
        let input = indoc! {r#"
            metadata:
              name: mariadb
              namespace: default
            spec:
              storage:
                size: 10
              resources:
                requests:
                  cpu: 1
        "#};

        let output = render(ResourceKind::MariaDb.data_source().as_ref(), input, false).unwrap();
        let manifest: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(manifest["spec"]["storage"]["size"], "10");
        assert_eq!(manifest["spec"]["resources"]["requests"]["cpu"], "1");
    }

    #[test]
    fn test_render_json_input_as_state() {
        let input = r#"{"metadata": {"name": "app", "namespace": "default"}}"#;

        let output = render(ResourceKind::User.data_source().as_ref(), input, true).unwrap();
        let states: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(states[0]["id"], "default/app");
        assert_eq!(states[0]["spec"], serde_json::Value::Null);
        assert_eq!(
            states[0]["yaml"],
            "apiVersion: k8s.mariadb.com/v1alpha1\nkind: User\nmetadata:\n  name: app\n  namespace: default\n"
        );
    }

    #[test]
    fn test_render_reports_failing_document() {
        let input = indoc! {r#"
            metadata:
              name: app
              namespace: default
            ---
            metadata:
              name: app
        "#};

        let error = render(ResourceKind::Database.data_source().as_ref(), input, false).unwrap_err();
        assert!(matches!(error, Error::ReadDataSource { index: 1, .. }));
    }
}
