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
            LocalObjectReference, MariaDbRef, RestartPolicy, S3, StorageVolumeSource,
            TemplateMetadata,
        },
        ResourceSpec,
    },
    validation::{self, Errors},
};

/// Restores a `MariaDB` from a backup.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RestoreSpec {
    /// The `MariaDB` to restore into.
    pub maria_db_ref: MariaDbRef,

    /// The `Backup` to restore from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_ref: Option<LocalObjectReference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<StorageVolumeSource>,

    /// RFC 3339 date-time used to pick the closest backup, e.g. `2023-09-25T18:35:00Z`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_recovery_time: Option<String>,

    /// Restores a single database of a multi-database backup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

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
}

impl ResourceSpec for RestoreSpec {
    const KIND: &'static str = "Restore";

    fn validate(&self, errors: &mut Errors) {
        if self.backup_ref.is_none() && self.s3.is_none() && self.volume.is_none() {
            errors.push(
                "spec",
                validation::Error::MissingOneOf {
                    fields: &["backupRef", "s3", "volume"],
                },
            );
        }
        if let Some(target_recovery_time) = &self.target_recovery_time {
            errors.check(
                "spec.targetRecoveryTime",
                validation::is_date_time(target_recovery_time),
            );
        }
        if let Some(metadata) = &self.inherit_metadata {
            metadata.validate(errors, "spec.inheritMetadata");
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_restore_from_backup() {
        let input = indoc! {r#"
            mariaDbRef:
              name: mariadb
            backupRef:
              name: backup
            targetRecoveryTime: 2023-09-25T18:35:00Z
        "#};
        let spec: RestoreSpec = serde_yaml::from_str(input).expect("illegal test input");

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(
            spec.backup_ref,
            Some(LocalObjectReference {
                name: "backup".to_string()
            })
        );
    }

    #[rstest]
    #[case("backupRef:\n  name: backup\ntargetRecoveryTime: last tuesday\n", &["spec.targetRecoveryTime"])]
    #[case("database: app\n", &["spec"])]
    fn test_invalid_restore(#[case] fields: &str, #[case] paths: &[&str]) {
        let input = format!("mariaDbRef:\n  name: mariadb\n{fields}");
        let spec: RestoreSpec = serde_yaml::from_str(&input).expect("illegal test input");

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        let found = errors.iter().map(|e| e.path().to_owned()).collect::<Vec<_>>();
        assert_eq!(found, paths);
    }
}
