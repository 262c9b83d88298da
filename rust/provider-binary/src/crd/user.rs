use serde::{Deserialize, Serialize};
use stackable_operator::schemars::{self, JsonSchema};

use crate::crd::{
    commons::{CleanupPolicy, MariaDbRef, PasswordPlugin, SecretKeySelector},
    ResourceSpec,
};

/// A SQL user inside a `MariaDB` server.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UserSpec {
    /// The `MariaDB` the user is created in.
    pub maria_db_ref: MariaDbRef,

    /// Reference to the `Secret` key holding the plain text password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_secret_key_ref: Option<SecretKeySelector>,

    /// Reference to the `Secret` key holding the password hash, as returned by `PASSWORD()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash_secret_key_ref: Option<SecretKeySelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_plugin: Option<PasswordPlugin>,

    /// Maximum number of simultaneous connections of the user. Defaults to `10`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_user_connections: Option<i32>,

    /// Name of the user. Defaults to `metadata.name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Host the user connects from, e.g. `%`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<CleanupPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requeue_interval: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<String>,
}

impl ResourceSpec for UserSpec {
    const KIND: &'static str = "User";
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_user_spec() {
        let input = indoc! {r#"
            mariaDbRef:
              name: mariadb
            passwordSecretKeyRef:
              name: user-password
              key: password
            maxUserConnections: 20
            host: '%'
        "#};
        let spec: UserSpec = serde_yaml::from_str(input).expect("illegal test input");

        assert_eq!(spec.max_user_connections, Some(20));
        assert_eq!(spec.host.as_deref(), Some("%"));
        assert_eq!(spec.password_hash_secret_key_ref, None);
        assert_eq!(serde_yaml::to_string(&spec).unwrap(), input);
    }
}
