// This is adapted from Kubernetes.
// See apimachinery/pkg/util/validation/validation.go in the Kubernetes source

use std::{fmt::Display, sync::LazyLock};

use const_format::concatcp;
use regex::Regex;
use snafu::{ResultExt, Snafu};
use stackable_operator::kvp;

const RFC_1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
const LOWERCASE_RFC_1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const LOWERCASE_RFC_1123_SUBDOMAIN_FMT: &str = concatcp!(
    LOWERCASE_RFC_1123_LABEL_FMT,
    "(\\.",
    LOWERCASE_RFC_1123_LABEL_FMT,
    ")*"
);
const LOWERCASE_RFC_1123_SUBDOMAIN_ERROR_MSG: &str = "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character";

static LOWERCASE_RFC_1123_SUBDOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{LOWERCASE_RFC_1123_SUBDOMAIN_FMT}$"))
        .expect("failed to compile RFC 1123 subdomain regex")
});

/// A single validation error.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(transparent)]
    Regex { source: RegexError },

    #[snafu(display("input is {length} bytes long but must be no more than {max_length}"))]
    TooLong { length: usize, max_length: usize },

    #[snafu(display("input must not be empty"))]
    Empty,

    #[snafu(display("invalid namespace name: {source}"))]
    InvalidNamespace {
        source: stackable_operator::validation::Errors,
    },

    #[snafu(display("invalid key: {source}"))]
    InvalidKey { source: kvp::KeyError },

    #[snafu(display("invalid label value: {source}"))]
    InvalidLabelValue { source: kvp::label::LabelValueError },

    #[snafu(display("unknown field, it would be dropped from the manifest"))]
    UnknownField,

    #[snafu(display("list has {count} item(s) but must have at least {min}"))]
    TooFewItems { count: usize, min: usize },

    #[snafu(display("{value:?} is not a RFC 3339 date-time"))]
    InvalidDateTime { source: jiff::Error, value: String },

    #[snafu(display("total size is {size} bytes but must be no more than {max_size}"))]
    TotalSizeTooLarge { size: usize, max_size: usize },

    #[snafu(display("at least one of {fields:?} must be set"))]
    MissingOneOf { fields: &'static [&'static str] },
}

#[derive(Debug)]
pub struct RegexError {
    /// The primary error message.
    msg: &'static str,

    /// The regex that the input must match.
    regex: &'static str,

    /// Examples of valid inputs (if non-empty).
    examples: &'static [&'static str],
}

impl Display for RegexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            msg,
            regex,
            examples,
        } = self;
        write!(f, "{msg} (")?;
        for (i, example) in examples.iter().enumerate() {
            let prefix = match i {
                0 => "e.g.",
                _ => "or",
            };
            write!(f, "{prefix} {example:?}, ")?;
        }
        write!(f, "regex used for validation is {regex:?})")
    }
}

impl std::error::Error for RegexError {}

/// A validation [`Error`] attributed to the configuration field it was found in.
#[derive(Debug, Snafu)]
#[snafu(display("{path}: {source}"))]
pub struct FieldError {
    path: String,
    source: Error,
}

impl FieldError {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn error(&self) -> &Error {
        &self.source
    }
}

/// A collection of errors discovered during validation.
#[derive(Debug, Default)]
pub struct Errors(Vec<FieldError>);

impl Errors {
    /// Records the error of `result` (if any) for the field at `path`.
    pub fn check(&mut self, path: impl Into<String>, result: Result<(), Error>) {
        if let Err(source) = result {
            self.push(path, source);
        }
    }

    pub fn push(&mut self, path: impl Into<String>, error: Error) {
        self.0.push(FieldError {
            path: path.into(),
            source: error,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Returns [`Ok`] if no errors were recorded, otherwise returns all of them.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            let prefix = match i {
                0 => "",
                _ => ", ",
            };
            write!(f, "{prefix}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

/// Returns [`Ok`] if `value`'s length fits within `max_length`.
fn validate_str_length(value: &str, max_length: usize) -> Result<(), Error> {
    if value.len() > max_length {
        TooLongSnafu {
            length: value.len(),
            max_length,
        }
        .fail()
    } else {
        Ok(())
    }
}

/// Returns [`Ok`] if `value` matches `regex`.
fn validate_str_regex(
    value: &str,
    regex: &'static Regex,
    error_msg: &'static str,
    examples: &'static [&'static str],
) -> Result<(), Error> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(RegexError {
            msg: error_msg,
            regex: regex
                .as_str()
                // Clean up start/end-of-line markers
                .trim_start_matches('^')
                .trim_end_matches('$'),
            examples,
        }
        .into())
    }
}

/// Tests for a namespace name, which Kubernetes requires to be a RFC 1035 label.
pub fn is_namespace_name(value: &str) -> Result<(), Error> {
    stackable_operator::validation::validate_namespace_name(value, false)
        .context(InvalidNamespaceSnafu)
}

/// Tests for a lowercase RFC 1123 subdomain, which is what Kubernetes requires for most object
/// names.
pub fn is_lowercase_rfc_1123_subdomain(value: &str) -> Result<(), Error> {
    validate_str_length(value, RFC_1123_SUBDOMAIN_MAX_LENGTH)?;
    validate_str_regex(
        value,
        &LOWERCASE_RFC_1123_SUBDOMAIN_REGEX,
        LOWERCASE_RFC_1123_SUBDOMAIN_ERROR_MSG,
        &["example.com"],
    )
}

/// Tests for a label or annotation key, e.g. `app.kubernetes.io/name`.
pub fn is_key(value: &str) -> Result<(), Error> {
    value
        .parse::<kvp::Key>()
        .map(|_| ())
        .context(InvalidKeySnafu)
}

/// Tests for a label value. Unlike keys, label values may be empty.
pub fn is_label_value(value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Ok(());
    }
    value
        .parse::<kvp::LabelValue>()
        .map(|_| ())
        .context(InvalidLabelValueSnafu)
}

/// Tests for a RFC 3339 date-time such as `2023-09-25T18:35:00Z`.
pub fn is_date_time(value: &str) -> Result<(), Error> {
    value
        .parse::<jiff::Timestamp>()
        .map(|_| ())
        .context(InvalidDateTimeSnafu { value })
}

pub fn is_not_empty(value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        EmptySnafu.fail()
    } else {
        Ok(())
    }
}

pub fn has_min_items<T>(items: &[T], min: usize) -> Result<(), Error> {
    if items.len() < min {
        TooFewItemsSnafu {
            count: items.len(),
            min,
        }
        .fail()
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("db1")]
    #[case("mariadb-galera")]
    #[case("backup.daily")]
    #[case("0-to-9")]
    fn valid_subdomains(#[case] value: &str) {
        assert!(is_lowercase_rfc_1123_subdomain(value).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("MariaDB")]
    #[case("-db")]
    #[case("db-")]
    #[case("db_1")]
    #[case("db..1")]
    fn invalid_subdomains(#[case] value: &str) {
        assert!(is_lowercase_rfc_1123_subdomain(value).is_err());
    }

    #[test]
    fn subdomain_too_long() {
        let value = "a".repeat(254);
        assert!(matches!(
            is_lowercase_rfc_1123_subdomain(&value),
            Err(Error::TooLong {
                length: 254,
                max_length: 253
            })
        ));
    }

    #[rstest]
    #[case("default", true)]
    #[case("mariadb-system", true)]
    #[case("kube.system", false)]
    #[case("Default", false)]
    #[case("1databases", false)]
    fn namespace_names(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_namespace_name(value).is_ok(), valid);
    }

    #[rstest]
    #[case("app", true)]
    #[case("app.kubernetes.io/name", true)]
    #[case("k8s.mariadb.com/watch", true)]
    #[case("my-key.v1", true)]
    #[case("/name", false)]
    #[case("example.com/", false)]
    #[case("a/b/c", false)]
    #[case("-app", false)]
    fn keys(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_key(value).is_ok(), valid);
    }

    #[rstest]
    #[case("", true)]
    #[case("mariadb", true)]
    #[case("10.11.2", true)]
    #[case("with space", false)]
    #[case("trailing-", false)]
    fn label_values(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_label_value(value).is_ok(), valid);
    }

    #[rstest]
    #[case("2023-09-25T18:35:00Z", true)]
    #[case("2023-09-25T18:35:00+02:00", true)]
    #[case("2023-09-25", false)]
    #[case("yesterday", false)]
    fn date_times(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_date_time(value).is_ok(), valid);
    }

    #[test]
    fn regex_error_message() {
        let error = is_lowercase_rfc_1123_subdomain("Nope").unwrap_err();
        assert_eq!(
            error.to_string(),
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character (e.g. \"example.com\", regex used for validation is \"[a-z0-9]([-a-z0-9]*[a-z0-9])?(\\\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*\")"
        );
    }

    #[test]
    fn errors_are_collected_with_paths() {
        let mut errors = Errors::default();
        errors.check("metadata.name", is_lowercase_rfc_1123_subdomain("db1"));
        assert!(errors.is_empty());

        errors.check("metadata.name", is_lowercase_rfc_1123_subdomain("DB1"));
        errors.check("spec.privileges", has_min_items::<String>(&[], 1));
        let paths = errors.iter().map(FieldError::path).collect::<Vec<_>>();
        assert_eq!(paths, vec!["metadata.name", "spec.privileges"]);

        let error = errors.into_result().unwrap_err();
        assert!(error
            .to_string()
            .ends_with(", spec.privileges: list has 0 item(s) but must have at least 1"));
    }
}
