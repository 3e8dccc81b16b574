//! Field name translation between manifest and schema conventions
//!
//! Kubernetes manifests use camelCase (`secretName`, `podCIDR`) while
//! resource schemas use snake_case (`secret_name`, `pod_cidr`). The mapping
//! is not invertible for acronyms, which is why attributes store both names.

/// Convert a manifest field name to a schema attribute name
///
/// Runs of capitals are treated as one word (`podCIDR` → `pod_cidr`,
/// `TLSConfig` → `tls_config`). Characters that are not ASCII alphanumerics
/// become underscores, and names starting with a digit get a leading
/// underscore, so the result is always a valid attribute name.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') || out.is_empty() {
            out.push('_');
        }
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Convert a schema attribute name to a manifest field name
///
/// `secret_name` → `secretName`. Leading underscores are dropped.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;

    for c in name.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
