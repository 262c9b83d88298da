pub mod backup;
pub mod commons;
pub mod connection;
pub mod database;
pub mod grant;
pub mod mariadb;
pub mod restore;
pub mod sql_job;
pub mod user;

use const_format::concatcp;
use serde::{de::DeserializeOwned, Serialize};
use stackable_operator::schemars::JsonSchema;
use strum::{Display, EnumIter, EnumString};

use crate::validation::Errors;

pub const GROUP: &str = "k8s.mariadb.com";
pub const VERSION: &str = "v1alpha1";
pub const API_VERSION: &str = concatcp!(GROUP, "/", VERSION);

/// The `spec` of a MariaDB operator custom resource.
///
/// `KIND` and `API_VERSION` are the identity fields of the rendered manifest. They are
/// compiled in and never read from the configuration.
pub trait ResourceSpec: Serialize + DeserializeOwned + JsonSchema {
    const KIND: &'static str;
    const API_VERSION: &'static str = API_VERSION;

    /// Checks the rules the configuration has to satisfy beyond its types. Paths are relative
    /// to `spec`.
    fn validate(&self, _errors: &mut Errors) {}
}

#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, PartialEq)]
#[strum(ascii_case_insensitive)]
pub enum ResourceKind {
    Backup,
    Connection,
    Database,
    Grant,
    #[strum(serialize = "MariaDB")]
    MariaDb,
    Restore,
    SqlJob,
    User,
}
