use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackable_operator::{
    k8s_openapi::api::core::v1::{
        CSIVolumeSource, EmptyDirVolumeSource, HostPathVolumeSource, NFSVolumeSource,
        PersistentVolumeClaimVolumeSource,
    },
    schemars::{self, JsonSchema},
};

use crate::{
    metadata,
    validation::{self, Errors},
};

/// Reference to a `MariaDB` object.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct MariaDbRef {
    /// Name of the referent.
    pub name: String,

    /// Namespace of the referent. Defaults to the namespace of the referring object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Whether the operator waits for the referenced `MariaDB` to be ready before proceeding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_it: Option<bool>,
}

/// Reference to an object, optionally in another namespace.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ObjectReference {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Reference to an object in the same namespace.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocalObjectReference {
    pub name: String,
}

/// Selects a key of a `Secret`.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecretKeySelector {
    /// Name of the `Secret`.
    pub name: String,

    /// The key of the `Secret` to select from.
    pub key: String,
}

/// Selects a key of a `Secret` that the operator may generate if it does not exist.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedSecretKeyRef {
    pub name: String,

    pub key: String,

    /// Whether the `Secret` should be generated if it does not exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate: Option<bool>,
}

/// Selects a key of a `ConfigMap`.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigMapKeySelector {
    pub name: String,

    pub key: String,
}

/// Authentication plugin used to identify a user, e.g. `ed25519`.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PasswordPlugin {
    /// Reference to the `Secret` key containing the name of the plugin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_name_secret_key_ref: Option<SecretKeySelector>,

    /// Reference to the `Secret` key containing the arguments of the plugin, usually the
    /// hashed password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_arg_secret_key_ref: Option<SecretKeySelector>,
}

/// Labels and annotations propagated to the objects the operator creates.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl TemplateMetadata {
    pub fn validate(&self, errors: &mut Errors, path: &str) {
        if let Some(labels) = &self.labels {
            metadata::validate_labels(errors, &format!("{path}.labels"), labels);
        }
        if let Some(annotations) = &self.annotations {
            metadata::validate_annotations(errors, &format!("{path}.annotations"), annotations);
        }
    }
}

/// Cron schedule of a recurring job.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Schedule {
    /// Cron expression, e.g. `*/1 * * * *`.
    pub cron: String,

    /// Suspends the schedule. Already running jobs are not affected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,
}

impl Schedule {
    pub fn validate(&self, errors: &mut Errors, path: &str) {
        errors.check(format!("{path}.cron"), validation::is_not_empty(&self.cron));
    }
}

/// TLS settings of an S3 endpoint.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TlsS3 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Reference to a `Secret` key holding the CA bundle used to verify the endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_secret_key_ref: Option<SecretKeySelector>,
}

/// S3 compatible object storage.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct S3 {
    /// Name of the bucket.
    pub bucket: String,

    /// S3 API endpoint without scheme, e.g. `s3.amazonaws.com`.
    pub endpoint: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Path prefix inside the bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id_secret_key_ref: Option<SecretKeySelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key_secret_key_ref: Option<SecretKeySelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token_secret_key_ref: Option<SecretKeySelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsS3>,
}

/// Volume to store backups or to read them from.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StorageVolumeSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nfs: Option<NFSVolumeSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub csi: Option<CSIVolumeSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimVolumeSource>,
}

/// What happens to the SQL object when the Kubernetes resource is deleted.
#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum CleanupPolicy {
    Skip,
    Delete,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum RestartPolicy {
    Always,
    OnFailure,
    Never,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum ImagePullPolicy {
    Always,
    Never,
    IfNotPresent,
}

/// Template of the `Secret` holding the connection details.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SecretTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TemplateMetadata>,

    /// Key holding the DSN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Go template used to render the DSN, e.g.
    /// `mysql://{{ .Username }}:{{ .Password }}@{{ .Host }}:{{ .Port }}/{{ .Database }}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_key: Option<String>,
}

/// How often the connection is checked.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct HealthCheck {
    /// Interval between checks, e.g. `30s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Interval between checks after a failed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<String>,
}

/// Template of a `Connection` created alongside another resource.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ConnectionTemplate {
    /// Name of the `Secret` the connection details are written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_template: Option<SecretTemplate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,

    /// Extra parameters appended to the DSN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,

    /// Name of the `Service` to connect to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

impl ConnectionTemplate {
    pub fn validate(&self, errors: &mut Errors, path: &str) {
        if let Some(metadata) = self
            .secret_template
            .as_ref()
            .and_then(|template| template.metadata.as_ref())
        {
            metadata.validate(errors, &format!("{path}.secretTemplate.metadata"));
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_enums_use_crd_values() {
        assert_eq!(
            serde_yaml::to_string(&CleanupPolicy::Delete).unwrap(),
            "Delete\n"
        );
        assert_eq!(
            serde_yaml::to_string(&RestartPolicy::OnFailure).unwrap(),
            "OnFailure\n"
        );
        assert!(serde_yaml::from_str::<ImagePullPolicy>("Sometimes").is_err());
    }

    #[test]
    fn test_s3_omits_unset_fields() {
        let input = indoc! {r#"
            bucket: backups
            endpoint: s3.amazonaws.com
            tls:
              enabled: true
        "#};
        let s3: S3 = serde_yaml::from_str(input).expect("illegal test input");

        assert_eq!(serde_yaml::to_string(&s3).unwrap(), input);
    }

    #[test]
    fn test_template_metadata_validation() {
        let input = indoc! {r#"
            labels:
              "sidecar.istio.io/inject": "false"
              "bad key": value
        "#};
        let metadata: TemplateMetadata = serde_yaml::from_str(input).expect("illegal test input");

        let mut errors = Errors::default();
        metadata.validate(&mut errors, "spec.inheritMetadata");
        let paths = errors.iter().map(|e| e.path().to_owned()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["spec.inheritMetadata.labels[\"bad key\"]"]);
    }

    #[test]
    fn test_empty_cron_is_rejected() {
        let schedule = Schedule {
            cron: " ".to_string(),
            suspend: None,
        };

        let mut errors = Errors::default();
        schedule.validate(&mut errors, "spec.schedule");
        assert!(!errors.is_empty());
    }
}
