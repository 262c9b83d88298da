use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackable_operator::schemars::{self, JsonSchema};

use crate::{
    crd::{
        commons::{
            HealthCheck, LocalObjectReference, MariaDbRef, ObjectReference, SecretKeySelector,
            SecretTemplate,
        },
        ResourceSpec,
    },
    validation::{self, Errors},
};

/// Connection details of a database user, written to a `Secret`.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ConnectionSpec {
    /// The `MariaDB` to connect to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maria_db_ref: Option<MariaDbRef>,

    /// The `MaxScale` to connect to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale_ref: Option<ObjectReference>,

    /// User used to connect.
    pub username: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_secret_key_ref: Option<SecretKeySelector>,

    /// `Secret` holding a client certificate used to authenticate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_cert_secret_ref: Option<LocalObjectReference>,

    /// Host to connect to. Takes precedence over the referenced server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

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

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

impl ResourceSpec for ConnectionSpec {
    const KIND: &'static str = "Connection";

    fn validate(&self, errors: &mut Errors) {
        errors.check("spec.username", validation::is_not_empty(&self.username));
        if let Some(metadata) = self
            .secret_template
            .as_ref()
            .and_then(|template| template.metadata.as_ref())
        {
            metadata.validate(errors, "spec.secretTemplate.metadata");
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_connection_spec() {
        let input = indoc! {r#"
            mariaDbRef:
              name: mariadb
            username: app
            passwordSecretKeyRef:
              name: app-password
              key: password
            database: app
            secretName: app-connection
            secretTemplate:
              key: dsn
              format: mysql://{{ .Username }}:{{ .Password }}@{{ .Host }}:{{ .Port }}/{{ .Database }}
            healthCheck:
              interval: 30s
            params:
              parseTime: 'true'
              timeout: 5s
        "#};
        let spec: ConnectionSpec = serde_yaml::from_str(input).expect("illegal test input");

        assert_eq!(spec.username, "app");
        assert_eq!(
            spec.params.as_ref().and_then(|params| params.get("parseTime")),
            Some(&"true".to_string())
        );
        assert_eq!(spec.max_scale_ref, None);
        assert_eq!(spec.port, None);

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        assert!(errors.is_empty(), "{errors}");
    }

    #[test]
    fn test_connection_spec_rejects_unknown_fields() {
        let input = indoc! {r#"
            username: app
            status:
              ready: true
        "#};
        assert!(serde_yaml::from_str::<ConnectionSpec>(input).is_err());
    }
}
