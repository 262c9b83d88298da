use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackable_operator::schemars::{self, JsonSchema};

use crate::validation::{self, Errors};

/// Kubernetes caps the combined size of all annotation keys and values of an object.
pub const ANNOTATIONS_TOTAL_SIZE_LIMIT: usize = 256 * 1024;

/// Data that helps uniquely identify this object.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    /// Unique identifier for this object. Must be a lowercase RFC 1123 subdomain.
    pub name: String,

    /// Namespace the object lives in. Must be a RFC 1035 label.
    pub namespace: String,

    /// Map of string keys and values that can be used to organize and categorize objects.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Unstructured key value map stored with a resource that may be set by external tools.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Metadata {
    /// The identifier of the rendered object, `<namespace>/<name>`.
    pub fn id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn validate(&self, errors: &mut Errors) {
        errors.check(
            "metadata.name",
            validation::is_lowercase_rfc_1123_subdomain(&self.name),
        );
        errors.check(
            "metadata.namespace",
            validation::is_namespace_name(&self.namespace),
        );
        validate_labels(errors, "metadata.labels", &self.labels);
        validate_annotations(errors, "metadata.annotations", &self.annotations);
    }
}

pub fn validate_labels(errors: &mut Errors, path: &str, labels: &BTreeMap<String, String>) {
    for (key, value) in labels {
        errors.check(format!("{path}[{key:?}]"), validation::is_key(key));
        errors.check(format!("{path}[{key:?}]"), validation::is_label_value(value));
    }
}

pub fn validate_annotations(
    errors: &mut Errors,
    path: &str,
    annotations: &BTreeMap<String, String>,
) {
    for key in annotations.keys() {
        errors.check(format!("{path}[{key:?}]"), validation::is_key(key));
    }

    let size = annotations
        .iter()
        .map(|(key, value)| key.len() + value.len())
        .sum::<usize>();
    if size > ANNOTATIONS_TOTAL_SIZE_LIMIT {
        errors.push(
            path,
            validation::Error::TotalSizeTooLarge {
                size,
                max_size: ANNOTATIONS_TOTAL_SIZE_LIMIT,
            },
        );
    }
}
