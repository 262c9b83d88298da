use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackable_operator::{
    k8s_openapi::{
        api::core::v1::{
            Affinity, EnvFromSource, EnvVar, PersistentVolumeClaimSpec, PodSecurityContext, Probe,
            ResourceRequirements, SecurityContext, Toleration, TopologySpreadConstraint, Volume,
            VolumeMount,
        },
        apimachinery::pkg::{api::resource::Quantity, util::intstr::IntOrString},
    },
    schemars::{self, JsonSchema},
};

use crate::{
    crd::{
        commons::{
            ConfigMapKeySelector, ConnectionTemplate, GeneratedSecretKeyRef, ImagePullPolicy,
            LocalObjectReference, ObjectReference, PasswordPlugin, S3, SecretKeySelector,
            StorageVolumeSource, TemplateMetadata,
        },
        ResourceSpec,
    },
    validation::{self, Errors},
};

/// A MariaDB server, optionally replicated or clustered with Galera.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct MariaDbSpec {
    /// Container image of the server, e.g. `docker-registry1.mariadb.com/library/mariadb:11.4.3`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<ImagePullPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<LocalObjectReference>>,

    /// Password of the `root` user. Generated if the `Secret` does not exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_password_secret_key_ref: Option<GeneratedSecretKeyRef>,

    /// Allows the `root` user to have an empty password. Not meant for production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_empty_password: Option<bool>,

    /// Database created on first start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// User created on first start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_secret_key_ref: Option<GeneratedSecretKeyRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash_secret_key_ref: Option<SecretKeySelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_plugin: Option<PasswordPlugin>,

    /// Inline `my.cnf` configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_cnf: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_cnf_config_map_key_ref: Option<ConfigMapKeySelector>,

    /// Time zone of the server, e.g. `UTC`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Allows an even number of replicas, which is prone to split brain with Galera.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas_allow_even_number: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication: Option<Replication>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub galera: Option<Galera>,

    /// The `MaxScale` proxy in front of this server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale_ref: Option<ObjectReference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_from: Option<BootstrapFrom>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceTemplate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionTemplate>,

    /// `Service` pointing at the primary, only used with replication or Galera.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_service: Option<ServiceTemplate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_connection: Option<ConnectionTemplate>,

    /// `Service` pointing at the secondaries, only used with replication or Galera.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_service: Option<ServiceTemplate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_connection: Option<ConnectionTemplate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_disruption_budget: Option<PodDisruptionBudget>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_strategy: Option<UpdateStrategy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_from: Option<Vec<EnvFromSource>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology_spread_constraints: Option<Vec<TopologySpreadConstraint>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_security_context: Option<PodSecurityContext>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<Probe>,

    /// Labels and annotations inherited by every object the operator creates for this server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherit_metadata: Option<TemplateMetadata>,

    /// Labels and annotations of the server `Pod`s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_metadata: Option<TemplateMetadata>,

    /// Stops reconciliation, e.g. during manual maintenance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Storage {
    /// Uses an `emptyDir` instead of a `PersistentVolumeClaim`. Data does not survive restarts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,

    /// Size of the data volume, e.g. `10Gi`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,

    /// Resizes the volumes of running `Pod`s when `size` grows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_in_use_volumes: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_volume_resize: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_claim_template: Option<PersistentVolumeClaimSpec>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PrimaryReplication {
    /// Index of the `Pod` acting as primary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_index: Option<i32>,

    /// Promotes a replica when the primary becomes unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_failover: Option<bool>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum WaitPoint {
    AfterSync,
    AfterCommit,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum Gtid {
    CurrentPos,
    SlavePos,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ReplicaReplication {
    /// Point at which the primary waits for the replica acknowledgement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_point: Option<WaitPoint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gtid: Option<Gtid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_retries: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_timeout: Option<String>,
}

/// Asynchronous primary/replica replication.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Replication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<PrimaryReplication>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica: Option<ReplicaReplication>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_binlog: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes_enabled: Option<bool>,
}

/// State snapshot transfer method used by Galera to sync a joining node.
#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sst {
    Rsync,
    Mariabackup,
    Mysqldump,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct GaleraRecovery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Number or percentage of `Pod`s that have to be up to consider the cluster healthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_cluster_size: Option<IntOrString>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_monitor_interval: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_healthy_timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_bootstrap_timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_recovery_timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_sync_timeout: Option<String>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct GaleraConfig {
    /// Stores the Galera configuration in the data volume instead of a separate one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reuse_storage_volume: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_claim_template: Option<PersistentVolumeClaimSpec>,
}

/// Synchronous multi-primary clustering.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Galera {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sst: Option<Sst>,

    /// Keeps a donor node available for queries while it transfers state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_when_donor: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub galera_lib_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_threads: Option<i32>,

    /// Extra `wsrep_provider_options`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_options: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<PrimaryReplication>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<GaleraRecovery>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GaleraConfig>,
}

/// Source of the initial data of a new server.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BootstrapFrom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_ref: Option<LocalObjectReference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<StorageVolumeSource>,

    /// RFC 3339 date-time used to pick the closest backup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_recovery_time: Option<String>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Exporter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<ImagePullPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ServiceMonitor {
    /// Value of the `release` label the Prometheus instance selects `ServiceMonitor`s by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prometheus_release: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape_timeout: Option<String>,
}

/// Prometheus exporter sidecar and `ServiceMonitor`.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exporter: Option<Exporter>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_monitor: Option<ServiceMonitor>,

    /// User the exporter connects as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_secret_key_ref: Option<GeneratedSecretKeyRef>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum ServiceType {
    ClusterIP,
    NodePort,
    LoadBalancer,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum ExternalTrafficPolicy {
    Cluster,
    Local,
}

/// Template of a `Service` created by the operator.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ServiceTemplate {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<ServiceType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TemplateMetadata>,

    #[serde(rename = "loadBalancerIP", skip_serializing_if = "Option::is_none")]
    pub load_balancer_ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_source_ranges: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_traffic_policy: Option<ExternalTrafficPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_affinity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocate_load_balancer_node_ports: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PodDisruptionBudget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_available: Option<IntOrString>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<IntOrString>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum UpdateType {
    ReplicasFirstPrimaryLast,
    RollingUpdate,
    OnDelete,
    Never,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateStrategy {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<UpdateType>,

    /// Updates the data plane images together with the operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_update_data_plane: Option<bool>,
}

impl ResourceSpec for MariaDbSpec {
    const KIND: &'static str = "MariaDB";

    fn validate(&self, errors: &mut Errors) {
        if let Some(target_recovery_time) = self
            .bootstrap_from
            .as_ref()
            .and_then(|bootstrap| bootstrap.target_recovery_time.as_deref())
        {
            errors.check(
                "spec.bootstrapFrom.targetRecoveryTime",
                validation::is_date_time(target_recovery_time),
            );
        }

        let services = [
            ("spec.service", &self.service),
            ("spec.primaryService", &self.primary_service),
            ("spec.secondaryService", &self.secondary_service),
        ];
        for (path, service) in services {
            if let Some(metadata) = service.as_ref().and_then(|s| s.metadata.as_ref()) {
                metadata.validate(errors, &format!("{path}.metadata"));
            }
        }

        let connections = [
            ("spec.connection", &self.connection),
            ("spec.primaryConnection", &self.primary_connection),
            ("spec.secondaryConnection", &self.secondary_connection),
        ];
        for (path, connection) in connections
            .into_iter()
            .filter_map(|(path, connection)| Some((path, connection.as_ref()?)))
        {
            connection.validate(errors, path);
        }

        if let Some(metadata) = &self.inherit_metadata {
            metadata.validate(errors, "spec.inheritMetadata");
        }
        if let Some(metadata) = &self.pod_metadata {
            metadata.validate(errors, "spec.podMetadata");
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_galera_cluster() {
        let input = indoc! {r#"
            rootPasswordSecretKeyRef:
              name: mariadb
              key: root-password
              generate: true
            replicas: 3
            storage:
              size: 1Gi
              storageClassName: standard
            galera:
              enabled: true
              sst: mariabackup
              primary:
                podIndex: 0
                automaticFailover: true
              recovery:
                enabled: true
                minClusterSize: 50%
            primaryService:
              type: LoadBalancer
              loadBalancerIP: 172.18.0.20
            podDisruptionBudget:
              maxUnavailable: 33%
            updateStrategy:
              type: ReplicasFirstPrimaryLast
        "#};
        let spec: MariaDbSpec = serde_yaml::from_str(input).expect("illegal test input");

        let galera = spec.galera.as_ref().unwrap();
        assert_eq!(galera.sst, Some(Sst::Mariabackup));
        assert_eq!(
            galera
                .recovery
                .as_ref()
                .and_then(|recovery| recovery.min_cluster_size.clone()),
            Some(IntOrString::String("50%".to_string()))
        );
        assert_eq!(
            spec.storage.as_ref().and_then(|storage| storage.size.clone()),
            Some(Quantity("1Gi".to_string()))
        );
        assert_eq!(spec.replication, None);

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(serde_yaml::to_string(&spec).unwrap(), input);
    }

    #[test]
    fn test_invalid_nested_metadata() {
        let input = indoc! {r#"
            bootstrapFrom:
              backupRef:
                name: backup
              targetRecoveryTime: soon
            service:
              metadata:
                annotations:
                  "metallb.universe.tf/loadBalancerIPs": 172.18.0.20
            secondaryConnection:
              secretTemplate:
                metadata:
                  labels:
                    "k8s.mariadb.com/": "x"
        "#};
        let spec: MariaDbSpec = serde_yaml::from_str(input).expect("illegal test input");

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        let paths = errors.iter().map(|e| e.path().to_owned()).collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                "spec.bootstrapFrom.targetRecoveryTime",
                "spec.secondaryConnection.secretTemplate.metadata.labels[\"k8s.mariadb.com/\"]",
            ]
        );
    }

    #[test]
    fn test_unknown_enum_values_are_rejected() {
        let input = indoc! {r#"
            galera:
              sst: xtrabackup
        "#};
        assert!(serde_yaml::from_str::<MariaDbSpec>(input).is_err());
    }
}
