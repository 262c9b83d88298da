//! Projection of a validated data source configuration onto a Kubernetes manifest.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use snafu::{ResultExt, Snafu};
use stackable_operator::schemars::{self, JsonSchema};

use crate::{
    crd::ResourceSpec,
    metadata::Metadata,
    validation::{self, Errors},
};

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(display("failed to serialize {kind} manifest"))]
    SerializeManifest {
        source: serde_yaml::Error,
        kind: &'static str,
    },
}

type Result<T, E = Error> = std::result::Result<T, E>;

/// The user supplied configuration of a manifest data source.
///
/// Identity fields are not part of the configuration, they are added by [`render`].
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestConfig<S> {
    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<S>,
}

impl<S: ResourceSpec> ManifestConfig<S> {
    /// Checks the configuration, reporting every violation found.
    pub fn validate(&self) -> Result<(), Errors> {
        let mut errors = Errors::default();
        self.collect_errors(&mut errors);
        errors.into_result()
    }

    pub fn collect_errors(&self, errors: &mut Errors) {
        self.metadata.validate(errors);
        if let Some(spec) = &self.spec {
            spec.validate(errors);
        }
    }
}

/// Reports every field of `input` that did not survive parsing into `parsed`.
///
/// The embedded Kubernetes types ignore keys they do not know, so a typo inside e.g.
/// `resources` would otherwise vanish from the manifest. Null values and empty collections
/// carry no data and are not reported.
pub fn check_unknown_fields(errors: &mut Errors, input: &Value, parsed: &Value) {
    walk_unknown_fields(errors, "", input, parsed);
}

fn walk_unknown_fields(errors: &mut Errors, path: &str, input: &Value, parsed: &Value) {
    match (input, parsed) {
        (Value::Mapping(input), Value::Mapping(parsed)) => {
            for (key, value) in input {
                if is_empty(value) || is_empty_sequence(value) {
                    continue;
                }
                let Some(key) = key_name(key) else {
                    continue;
                };
                let field_path = match path {
                    "" => key.clone(),
                    _ => format!("{path}.{key}"),
                };
                let parsed_value = parsed
                    .iter()
                    .find(|(parsed_key, _)| key_name(parsed_key).as_ref() == Some(&key))
                    .map(|(_, parsed_value)| parsed_value);
                match parsed_value {
                    Some(parsed_value) => {
                        walk_unknown_fields(errors, &field_path, value, parsed_value)
                    }
                    None => errors.push(field_path, validation::Error::UnknownField),
                }
            }
        }
        (Value::Sequence(input), Value::Sequence(parsed)) => {
            for (index, (value, parsed_value)) in input.iter().zip(parsed).enumerate() {
                walk_unknown_fields(errors, &format!("{path}[{index}]"), value, parsed_value);
            }
        }
        (Value::Tagged(input), _) => walk_unknown_fields(errors, path, &input.value, parsed),
        _ => {}
    }
}

/// Mapping keys as they appear in the rendered YAML, `1` and `"1"` are the same key.
fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(key) => Some(key.clone()),
        Value::Number(key) => Some(key.to_string()),
        Value::Bool(key) => Some(key.to_string()),
        _ => None,
    }
}

fn is_empty_sequence(value: &Value) -> bool {
    matches!(value, Value::Sequence(sequence) if sequence.is_empty())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    api_version: &'static str,
    kind: &'static str,
    metadata: &'a Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<Value>,
}

/// Renders the manifest of `config` as a YAML document.
///
/// A `spec` without any field set is left out entirely.
pub fn render<S: ResourceSpec>(config: &ManifestConfig<S>) -> Result<String> {
    let spec = config
        .spec
        .as_ref()
        .map(serde_yaml::to_value)
        .transpose()
        .context(SerializeManifestSnafu { kind: S::KIND })?
        .filter(|spec| !is_empty(spec));

    let manifest = Manifest {
        api_version: S::API_VERSION,
        kind: S::KIND,
        metadata: &config.metadata,
        spec,
    };
    serde_yaml::to_string(&manifest).context(SerializeManifestSnafu { kind: S::KIND })
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(mapping) => mapping.is_empty(),
        _ => false,
    }
}
