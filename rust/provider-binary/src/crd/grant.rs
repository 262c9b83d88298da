use serde::{Deserialize, Serialize};
use stackable_operator::schemars::{self, JsonSchema};

use crate::{
    crd::{
        commons::{CleanupPolicy, MariaDbRef},
        ResourceSpec,
    },
    validation::{self, Errors},
};

/// Privileges granted to a user on a database and table.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct GrantSpec {
    /// The `MariaDB` the grant is applied in.
    pub maria_db_ref: MariaDbRef,

    /// Privileges to grant, e.g. `SELECT`, `ALL PRIVILEGES`.
    pub privileges: Vec<String>,

    /// Database the privileges apply to. Defaults to `*`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Table the privileges apply to. Defaults to `*`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// User receiving the privileges.
    pub username: String,

    /// Host of the user receiving the privileges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Whether the user may grant its privileges to other users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_option: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<CleanupPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requeue_interval: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<String>,
}

impl ResourceSpec for GrantSpec {
    const KIND: &'static str = "Grant";

    fn validate(&self, errors: &mut Errors) {
        errors.check(
            "spec.privileges",
            validation::has_min_items(&self.privileges, 1),
        );
        for (index, privilege) in self.privileges.iter().enumerate() {
            errors.check(
                format!("spec.privileges[{index}]"),
                validation::is_not_empty(privilege),
            );
        }
        errors.check("spec.username", validation::is_not_empty(&self.username));
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_grant_spec() {
        let input = indoc! {r#"
            mariaDbRef:
              name: mariadb
            privileges:
            - SELECT
            - INSERT
            - UPDATE
            database: app
            table: '*'
            username: app
            grantOption: false
        "#};
        let spec: GrantSpec = serde_yaml::from_str(input).expect("illegal test input");

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(serde_yaml::to_string(&spec).unwrap(), input);
    }

    #[rstest]
    #[case("privileges: []", &["spec.privileges"])]
    #[case("privileges: ['']", &["spec.privileges[0]"])]
    #[case("privileges: [SELECT, ' ']", &["spec.privileges[1]"])]
    fn test_invalid_privileges(#[case] privileges: &str, #[case] paths: &[&str]) {
        let input = format!("mariaDbRef:\n  name: mariadb\nusername: app\n{privileges}\n");
        let spec: GrantSpec = serde_yaml::from_str(&input).expect("illegal test input");

        let mut errors = Errors::default();
        spec.validate(&mut errors);
        let found = errors.iter().map(|e| e.path().to_owned()).collect::<Vec<_>>();
        assert_eq!(found, paths);
    }
}
