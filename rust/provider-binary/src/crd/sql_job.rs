use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackable_operator::{
    k8s_openapi::api::core::v1::{
        Affinity, PodSecurityContext, ResourceRequirements, SecurityContext, Toleration,
    },
    schemars::{self, JsonSchema},
};

use crate::{
    crd::{
        commons::{
            ConfigMapKeySelector, LocalObjectReference, MariaDbRef, RestartPolicy, Schedule,
            SecretKeySelector, TemplateMetadata,
        },
        ResourceSpec,
    },
    validation::{self, Errors},
};

/// Runs SQL statements against a `MariaDB`, once or on a schedule.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SqlJobSpec {
    /// The `MariaDB` the statements run against.
    pub maria_db_ref: MariaDbRef,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,

    /// User the statements run as.
    pub username: String,

    pub password_secret_key_ref: SecretKeySelector,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// `SqlJob`s that have to complete before this one starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<LocalObjectReference>>,

    /// Inline SQL statements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    /// Reference to a `ConfigMap` key holding the SQL statements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_config_map_key_ref: Option<ConfigMapKeySelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_security_context: Option<PodSecurityContext>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<LocalObjectReference>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherit_metadata: Option<TemplateMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_limit: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_jobs_history_limit: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_jobs_history_limit: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ResourceSpec for SqlJobSpec {
    const KIND: &'static str = "SqlJob";

    fn validate(&self, errors: &mut Errors) {
        errors.check("spec.username", validation::is_not_empty(&self.username));
        if self.sql.is_none() && self.sql_config_map_key_ref.is_none() {
            errors.push(
                "spec",
                validation::Error::MissingOneOf {
                    fields: &["sql", "sqlConfigMapKeyRef"],
                },
            );
        }
        if let Some(schedule) = &self.schedule {
            schedule.validate(errors, "spec.schedule");
        }
        if let Some(metadata) = &self.inherit_metadata {
            metadata.validate(errors, "spec.inheritMetadata");
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_sql_job_with_multiline_sql() {
        let input = indoc! {r#"
            mariaDbRef:
              name: mariadb
            username: mariadb
            passwordSecretKeyRef:
              name: mariadb
              key: password
            database: mariadb
            dependsOn:
            - name: 01-users
            sql: |
              CREATE TABLE IF NOT EXISTS orders (
                id bigint PRIMARY KEY AUTO_INCREMENT
              );
        "#};
        let spec: SqlJobSpec = serde_yaml::from_str(input).expect("illegal test input");

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        assert!(errors.is_empty(), "{errors}");
        assert!(spec.sql.as_deref().unwrap().starts_with("CREATE TABLE"));
        assert_eq!(
            spec.depends_on,
            Some(vec![LocalObjectReference {
                name: "01-users".to_string()
            }])
        );
    }

    #[test]
    fn test_sql_job_requires_statements() {
        let input = indoc! {r#"
            mariaDbRef:
              name: mariadb
            username: mariadb
            passwordSecretKeyRef:
              name: mariadb
              key: password
            schedule:
              cron: ''
        "#};
        let spec: SqlJobSpec = serde_yaml::from_str(input).expect("illegal test input");

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        let paths = errors.iter().map(|e| e.path().to_owned()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["spec", "spec.schedule.cron"]);
    }
}
