//! Read-only data sources, one per MariaDB operator resource.
//!
//! Reading a data source parses and validates its configuration and computes the `id` and
//! `yaml` attributes.

use std::marker::PhantomData;

use convert_case::{Case, Casing};
use serde::Serialize;
use snafu::{ResultExt, Snafu};
use stackable_operator::schemars;
use strum::IntoEnumIterator;

use crate::{
    crd::{
        backup::BackupSpec, connection::ConnectionSpec, database::DatabaseSpec,
        grant::GrantSpec, mariadb::MariaDbSpec, restore::RestoreSpec, sql_job::SqlJobSpec,
        user::UserSpec, ResourceKind, ResourceSpec, GROUP, VERSION,
    },
    manifest::{self, ManifestConfig},
    metadata::Metadata,
    validation,
};

pub const PROVIDER_TYPE_NAME: &str = "k8s";

/// Attributes computed by [`DataSource::read`].
pub const COMPUTED_ATTRIBUTES: [&str; 2] = ["id", "yaml"];

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(display("failed to parse {type_name} configuration"))]
    ParseConfig {
        source: serde_yaml::Error,
        type_name: String,
    },

    #[snafu(display("invalid {type_name} configuration"))]
    InvalidConfig {
        source: validation::Errors,
        type_name: String,
    },

    #[snafu(display("failed to render {type_name} manifest"))]
    RenderManifest {
        source: manifest::Error,
        type_name: String,
    },

    #[snafu(display("failed to convert {type_name} configuration into a YAML tree"))]
    ConvertConfig {
        source: serde_yaml::Error,
        type_name: String,
    },

    #[snafu(display("failed to convert {type_name} spec into state"))]
    ConvertSpec {
        source: serde_json::Error,
        type_name: String,
    },

    #[snafu(display("failed to serialize {type_name} schema"))]
    SerializeSchema {
        source: serde_json::Error,
        type_name: String,
    },
}

type Result<T, E = Error> = std::result::Result<T, E>;

/// The state of a data source after it has been read.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataSourceState {
    /// `<namespace>/<name>` of the rendered object.
    pub id: String,
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
    /// The rendered manifest.
    pub yaml: String,
}

/// Describes the configuration a data source accepts.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSchema {
    pub type_name: String,
    pub description: String,
    pub computed_attributes: Vec<&'static str>,
    /// JSON schema of the configuration.
    pub configuration: serde_json::Value,
}

pub trait DataSource {
    /// The `kind` of the manifests this data source renders.
    fn kind(&self) -> &'static str;

    /// The name users refer to this data source by, e.g.
    /// `k8s_k8s_mariadb_com_database_v1alpha1_manifest`.
    fn type_name(&self) -> String;

    fn schema(&self) -> Result<DataSourceSchema>;

    /// Reads the configuration from a single YAML (or JSON) document.
    fn read(&self, document: &str) -> Result<DataSourceState>;
}

/// Renders manifests of the resource whose spec is `S`.
pub struct ManifestDataSource<S> {
    spec: PhantomData<S>,
}

impl<S> ManifestDataSource<S> {
    pub fn new() -> Self {
        Self { spec: PhantomData }
    }
}

impl<S> Default for ManifestDataSource<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ResourceSpec> DataSource for ManifestDataSource<S> {
    fn kind(&self) -> &'static str {
        S::KIND
    }

    fn type_name(&self) -> String {
        format!(
            "{PROVIDER_TYPE_NAME}_{group}_{kind}_{VERSION}_manifest",
            group = GROUP.replace('.', "_"),
            kind = S::KIND.to_case(Case::Snake),
        )
    }

    fn schema(&self) -> Result<DataSourceSchema> {
        let type_name = self.type_name();
        let configuration = serde_json::to_value(schemars::schema_for!(ManifestConfig<S>))
            .context(SerializeSchemaSnafu {
                type_name: &type_name,
            })?;

        Ok(DataSourceSchema {
            description: format!(
                "Creates a manifest of a {kind} ({api_version}) as YAML.",
                kind = S::KIND,
                api_version = S::API_VERSION
            ),
            type_name,
            computed_attributes: COMPUTED_ATTRIBUTES.to_vec(),
            configuration,
        })
    }

    fn read(&self, document: &str) -> Result<DataSourceState> {
        let type_name = self.type_name();
        tracing::debug!(%type_name, "reading data source");

        // From text: a generic tree rejects integer quantities such as `cpu: 1`.
        let config: ManifestConfig<S> =
            serde_yaml::from_str(document).context(ParseConfigSnafu {
                type_name: &type_name,
            })?;
        let input: serde_yaml::Value =
            serde_yaml::from_str(document).context(ParseConfigSnafu {
                type_name: &type_name,
            })?;
        let parsed = serde_yaml::to_value(&config).context(ConvertConfigSnafu {
            type_name: &type_name,
        })?;

        let mut errors = validation::Errors::default();
        manifest::check_unknown_fields(&mut errors, &input, &parsed);
        config.collect_errors(&mut errors);
        errors.into_result().context(InvalidConfigSnafu {
            type_name: &type_name,
        })?;

        let yaml = manifest::render(&config).context(RenderManifestSnafu {
            type_name: &type_name,
        })?;
        let spec = config
            .spec
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .context(ConvertSpecSnafu {
                type_name: &type_name,
            })?;

        Ok(DataSourceState {
            id: config.metadata.id(),
            metadata: config.metadata,
            spec,
            yaml,
        })
    }
}

impl ResourceKind {
    pub fn data_source(self) -> Box<dyn DataSource> {
        match self {
            Self::Backup => Box::new(ManifestDataSource::<BackupSpec>::new()),
            Self::Connection => Box::new(ManifestDataSource::<ConnectionSpec>::new()),
            Self::Database => Box::new(ManifestDataSource::<DatabaseSpec>::new()),
            Self::Grant => Box::new(ManifestDataSource::<GrantSpec>::new()),
            Self::MariaDb => Box::new(ManifestDataSource::<MariaDbSpec>::new()),
            Self::Restore => Box::new(ManifestDataSource::<RestoreSpec>::new()),
            Self::SqlJob => Box::new(ManifestDataSource::<SqlJobSpec>::new()),
            Self::User => Box::new(ManifestDataSource::<UserSpec>::new()),
        }
    }
}

/// All supported data sources, ordered by kind.
pub fn data_sources() -> Vec<Box<dyn DataSource>> {
    ResourceKind::iter().map(ResourceKind::data_source).collect()
}

/// Looks up a data source by its type name, or case-insensitively by kind.
pub fn find(name: &str) -> Option<Box<dyn DataSource>> {
    data_sources()
        .into_iter()
        .find(|data_source| data_source.type_name() == name)
        .or_else(|| {
            name.parse::<ResourceKind>()
                .ok()
                .map(ResourceKind::data_source)
        })
}
