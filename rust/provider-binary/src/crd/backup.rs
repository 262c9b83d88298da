use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackable_operator::{
    k8s_openapi::api::core::v1::{
        Affinity, PersistentVolumeClaimSpec, PodSecurityContext, ResourceRequirements,
        SecurityContext, Toleration,
    },
    schemars::{self, JsonSchema},
};

use crate::{
    crd::{
        commons::{
            LocalObjectReference, MariaDbRef, RestartPolicy, S3, Schedule, StorageVolumeSource,
            TemplateMetadata,
        },
        ResourceSpec,
    },
    validation::{self, Errors},
};

/// Where backups are stored. Exactly one of the storage types should be set.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BackupStorage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3>,

    /// Spec of a `PersistentVolumeClaim` created by the operator to store the backups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<StorageVolumeSource>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Bzip2,
    Gzip,
}

/// A logical backup of a `MariaDB`, taken once or on a schedule.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BackupSpec {
    /// The `MariaDB` to back up.
    pub maria_db_ref: MariaDbRef,

    pub storage: BackupStorage,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,

    /// How long backups are kept, e.g. `720h`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retention: Option<String>,

    /// Databases to back up. Defaults to all of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub databases: Option<Vec<String>>,

    /// Skips the `mysql.global_priv` table, which is not portable between servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_global_priv: Option<bool>,

    /// Log level of the backup job, e.g. `info`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,

    /// Extra arguments passed to `mariadb-dump`.
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

    /// Labels and annotations inherited by the `Job` and `CronJob` objects.
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

    /// Time zone of the `CronJob` schedule, e.g. `Europe/Berlin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ResourceSpec for BackupSpec {
    const KIND: &'static str = "Backup";

    fn validate(&self, errors: &mut Errors) {
        let BackupStorage {
            s3,
            persistent_volume_claim,
            volume,
        } = &self.storage;
        if s3.is_none() && persistent_volume_claim.is_none() && volume.is_none() {
            errors.push(
                "spec.storage",
                validation::Error::MissingOneOf {
                    fields: &["s3", "persistentVolumeClaim", "volume"],
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
