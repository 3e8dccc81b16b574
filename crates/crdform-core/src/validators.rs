//! Attribute validators
//!
//! Kubernetes syntax rules for object metadata plus the generic constraints
//! found in CRD OpenAPI schemas (enums, patterns, lengths, ranges).

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::value::AttrValue;

/// Maximum length of a DNS-1123 subdomain (object names)
pub const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;

/// Maximum length of a DNS-1123 label and of label values
pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;

/// Maximum length of the name part of a qualified name
pub const QUALIFIED_NAME_MAX_LENGTH: usize = 63;

/// Maximum combined size of all annotation keys and values
pub const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * 1024;

static DNS1123_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

static DNS1123_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

static QUALIFIED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid regex"));

static LABEL_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").expect("valid regex")
});

/// Check a DNS-1123 subdomain (`my-app.example.com`)
pub fn check_dns1123_subdomain(value: &str) -> std::result::Result<(), String> {
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        return Err(format!(
            "must be no more than {} characters",
            DNS1123_SUBDOMAIN_MAX_LENGTH
        ));
    }
    if !DNS1123_SUBDOMAIN.is_match(value) {
        return Err(
            "must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    Ok(())
}

/// Check a DNS-1123 label (`my-app`)
pub fn check_dns1123_label(value: &str) -> std::result::Result<(), String> {
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        return Err(format!(
            "must be no more than {} characters",
            DNS1123_LABEL_MAX_LENGTH
        ));
    }
    if !DNS1123_LABEL.is_match(value) {
        return Err(
            "must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    Ok(())
}

/// Check a qualified name with an optional DNS prefix (`app.kubernetes.io/name`)
pub fn check_qualified_name(value: &str) -> std::result::Result<(), String> {
    let (prefix, name) = match value.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, value),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            return Err("prefix part must be non-empty".to_string());
        }
        check_dns1123_subdomain(prefix).map_err(|e| format!("prefix part {}", e))?;
    }

    if name.is_empty() {
        return Err("name part must be non-empty".to_string());
    }
    if name.len() > QUALIFIED_NAME_MAX_LENGTH {
        return Err(format!(
            "name part must be no more than {} characters",
            QUALIFIED_NAME_MAX_LENGTH
        ));
    }
    if name.contains('/') {
        return Err("a qualified name may contain at most one '/'".to_string());
    }
    if !QUALIFIED_NAME.is_match(name) {
        return Err(
            "name part must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    Ok(())
}

/// Check a label value (may be empty)
pub fn check_label_value(value: &str) -> std::result::Result<(), String> {
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        return Err(format!(
            "must be no more than {} characters",
            DNS1123_LABEL_MAX_LENGTH
        ));
    }
    if !LABEL_VALUE.is_match(value) {
        return Err(
            "must be empty or consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    Ok(())
}

/// Compiled regular expression constraint
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|e| CoreError::InvalidValidator {
            message: format!("invalid pattern '{}': {}", source, e),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// A constraint attached to an attribute
#[derive(Debug, Clone)]
pub enum Validator {
    /// String is a DNS-1123 subdomain
    Dns1123Subdomain,
    /// String is a DNS-1123 label
    Dns1123Label,
    /// Every key of a map is a qualified name
    LabelKeys,
    /// Every value of a map is a valid label value
    LabelValues,
    /// Map keys are qualified names and the map stays under the size limit
    AnnotationKeys,
    /// String is one of the listed values
    OneOf(Vec<String>),
    /// String matches a regular expression (unanchored, as in OpenAPI)
    Pattern(Pattern),
    /// String length in characters
    Length { min: Option<u64>, max: Option<u64> },
    /// Numeric range, inclusive
    Range { min: Option<f64>, max: Option<f64> },
}

impl Validator {
    /// Build a pattern validator
    pub fn pattern(source: &str) -> Result<Self> {
        Ok(Self::Pattern(Pattern::new(source)?))
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Check a known value, returning every violation found
    ///
    /// Values of a type the validator does not apply to pass; type
    /// mismatches are reported by the schema walk instead.
    pub fn check(&self, value: &AttrValue) -> Vec<String> {
        match self {
            Self::Dns1123Subdomain => check_str(value, check_dns1123_subdomain),
            Self::Dns1123Label => check_str(value, check_dns1123_label),
            Self::LabelKeys => check_keys(value, "label key", check_qualified_name),
            Self::LabelValues => check_entries(value, |key, v| {
                v.as_str()
                    .and_then(|s| check_label_value(s).err())
                    .map(|e| format!("label value for '{}' {}", key, e))
            }),
            Self::AnnotationKeys => {
                let mut issues = check_keys(value, "annotation key", check_qualified_name);
                if let Some(entries) = value.as_object() {
                    let total: usize = entries
                        .iter()
                        .map(|(k, v)| k.len() + v.as_str().map_or(0, str::len))
                        .sum();
                    if total > TOTAL_ANNOTATION_SIZE_LIMIT {
                        issues.push(format!(
                            "annotations total {} bytes, more than the limit of {} bytes",
                            total, TOTAL_ANNOTATION_SIZE_LIMIT
                        ));
                    }
                }
                issues
            }
            Self::OneOf(allowed) => match value.as_str() {
                Some(s) if !allowed.iter().any(|a| a == s) => {
                    vec![format!("must be one of [{}], got '{}'", allowed.join(", "), s)]
                }
                _ => Vec::new(),
            },
            Self::Pattern(pattern) => match value.as_str() {
                Some(s) if !pattern.is_match(s) => {
                    vec![format!("must match pattern '{}'", pattern.as_str())]
                }
                _ => Vec::new(),
            },
            Self::Length { min, max } => {
                let Some(s) = value.as_str() else {
                    return Vec::new();
                };
                let len = s.chars().count() as u64;
                let mut issues = Vec::new();
                if let Some(min) = min.filter(|m| len < *m) {
                    issues.push(format!("must be at least {} characters", min));
                }
                if let Some(max) = max.filter(|m| len > *m) {
                    issues.push(format!("must be no more than {} characters", max));
                }
                issues
            }
            Self::Range { min, max } => {
                let Some(n) = value.as_f64() else {
                    return Vec::new();
                };
                let mut issues = Vec::new();
                if let Some(min) = min.filter(|m| n < *m) {
                    issues.push(format!("must be at least {}", min));
                }
                if let Some(max) = max.filter(|m| n > *m) {
                    issues.push(format!("must be at most {}", max));
                }
                issues
            }
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns1123Subdomain => write!(f, "DNS-1123 subdomain"),
            Self::Dns1123Label => write!(f, "DNS-1123 label"),
            Self::LabelKeys => write!(f, "label keys"),
            Self::LabelValues => write!(f, "label values"),
            Self::AnnotationKeys => write!(f, "annotation keys"),
            Self::OneOf(allowed) => write!(f, "one of [{}]", allowed.join(", ")),
            Self::Pattern(p) => write!(f, "pattern {}", p.as_str()),
            Self::Length { min, max } => write!(f, "length {}..{}", fmt_bound(min), fmt_bound(max)),
            Self::Range { min, max } => write!(f, "range {}..{}", fmt_bound(min), fmt_bound(max)),
        }
    }
}

fn fmt_bound<T: fmt::Display>(bound: &Option<T>) -> String {
    bound.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn check_str(value: &AttrValue, check: fn(&str) -> std::result::Result<(), String>) -> Vec<String> {
    value
        .as_str()
        .and_then(|s| check(s).err())
        .into_iter()
        .collect()
}

fn check_keys(
    value: &AttrValue,
    what: &str,
    check: fn(&str) -> std::result::Result<(), String>,
) -> Vec<String> {
    check_entries(value, |key, _| {
        check(key).err().map(|e| format!("{} '{}' {}", what, key, e))
    })
}

fn check_entries<F>(value: &AttrValue, mut check: F) -> Vec<String>
where
    F: FnMut(&str, &AttrValue) -> Option<String>,
{
    value
        .as_object()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(k, v)| check(k, v))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns1123_subdomain() {
        assert!(check_dns1123_subdomain("my-app").is_ok());
        assert!(check_dns1123_subdomain("my-app.example.com").is_ok());
        assert!(check_dns1123_subdomain("My-App").is_err());
        assert!(check_dns1123_subdomain("-leading").is_err());
        assert!(check_dns1123_subdomain("trailing.").is_err());
        assert!(check_dns1123_subdomain(&"a".repeat(254)).is_err());
        assert!(check_dns1123_subdomain(&"a".repeat(253)).is_ok());
    }

    #[test]
    fn test_dns1123_label() {
        assert!(check_dns1123_label("web-0").is_ok());
        assert!(check_dns1123_label("web.example").is_err());
        assert!(check_dns1123_label(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_qualified_names() {
        assert!(check_qualified_name("app").is_ok());
        assert!(check_qualified_name("app.kubernetes.io/name").is_ok());
        assert!(check_qualified_name("Example_Key.1").is_ok());
        assert!(check_qualified_name("/name").is_err());
        assert!(check_qualified_name("example.com/").is_err());
        assert!(check_qualified_name("a/b/c").is_err());
        assert!(check_qualified_name("UPPER.example.com/name").is_err());
        assert!(check_qualified_name("_leading").is_err());
    }

    #[test]
    fn test_label_values() {
        assert!(check_label_value("").is_ok());
        assert!(check_label_value("v1.2.3").is_ok());
        assert!(check_label_value("has space").is_err());
        assert!(check_label_value(&"v".repeat(64)).is_err());
    }

    #[test]
    fn test_label_validators_on_maps() {
        let labels = AttrValue::map([
            ("app.kubernetes.io/name", AttrValue::string("web")),
            ("bad key!", AttrValue::string("ok")),
            ("tier", AttrValue::string("not valid!")),
        ]);

        let key_issues = Validator::LabelKeys.check(&labels);
        assert_eq!(key_issues.len(), 1);
        assert!(key_issues[0].contains("bad key!"));

        let value_issues = Validator::LabelValues.check(&labels);
        assert_eq!(value_issues.len(), 1);
        assert!(value_issues[0].contains("tier"));
    }

    #[test]
    fn test_annotation_size_limit() {
        let big = "x".repeat(TOTAL_ANNOTATION_SIZE_LIMIT);
        let annotations = AttrValue::map([("note", AttrValue::string(big))]);

        let issues = Validator::AnnotationKeys.check(&annotations);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("limit"));
    }

    #[test]
    fn test_one_of() {
        let validator = Validator::one_of(["RSA", "ECDSA", "Ed25519"]);
        assert!(validator.check(&AttrValue::string("RSA")).is_empty());
        assert_eq!(validator.check(&AttrValue::string("DSA")).len(), 1);
        assert!(validator.check(&AttrValue::int(1)).is_empty());
    }

    #[test]
    fn test_pattern() {
        let validator = Validator::pattern(r"^[0-9]+(s|m|h)$").unwrap();
        assert!(validator.check(&AttrValue::string("90s")).is_empty());
        assert_eq!(validator.check(&AttrValue::string("soon")).len(), 1);
        assert!(Validator::pattern("(unclosed").is_err());
    }

    #[test]
    fn test_length_and_range() {
        let length = Validator::Length { min: Some(2), max: Some(4) };
        assert_eq!(length.check(&AttrValue::string("a")).len(), 1);
        assert!(length.check(&AttrValue::string("abc")).is_empty());
        assert_eq!(length.check(&AttrValue::string("abcde")).len(), 1);

        let range = Validator::Range { min: Some(0.0), max: Some(10.0) };
        assert!(range.check(&AttrValue::int(10)).is_empty());
        assert_eq!(range.check(&AttrValue::int(11)).len(), 1);
        assert_eq!(range.check(&AttrValue::float(-0.5)).len(), 1);
    }
}
