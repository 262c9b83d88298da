use serde::{Deserialize, Serialize};
use stackable_operator::schemars::{self, JsonSchema};

use crate::crd::{
    commons::{CleanupPolicy, MariaDbRef},
    ResourceSpec,
};

/// A logical database inside a `MariaDB` server.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DatabaseSpec {
    /// The `MariaDB` the database is created in.
    pub maria_db_ref: MariaDbRef,

    /// Character set of the database. Defaults to `utf8`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_set: Option<String>,

    /// Collation of the database. Defaults to `utf8_general_ci`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collate: Option<String>,

    /// Name of the database. Defaults to `metadata.name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<CleanupPolicy>,

    /// Interval at which the database is reconciled, e.g. `10h`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requeue_interval: Option<String>,

    /// Interval at which a failed reconciliation is retried, e.g. `5s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<String>,
}

impl ResourceSpec for DatabaseSpec {
    const KIND: &'static str = "Database";
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_database_spec() {
        let input = indoc! {r#"
            mariaDbRef:
              name: mariadb
              waitForIt: true
            characterSet: utf8mb4
            collate: utf8mb4_unicode_ci
            cleanupPolicy: Delete
        "#};
        let spec: DatabaseSpec = serde_yaml::from_str(input).expect("illegal test input");

        assert_eq!(spec.maria_db_ref.name, "mariadb");
        assert_eq!(spec.cleanup_policy, Some(CleanupPolicy::Delete));
        assert_eq!(spec.name, None);
        assert_eq!(serde_yaml::to_string(&spec).unwrap(), input);
    }

    #[test]
    fn test_database_spec_requires_mariadb_ref() {
        let error = serde_yaml::from_str::<DatabaseSpec>("characterSet: utf8\n").unwrap_err();
        assert!(error.to_string().contains("missing field `mariaDbRef`"));
    }
}
