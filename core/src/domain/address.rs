//! Target address validation and masking helpers.

use once_cell::sync::Lazy;
use regex::Regex;

// Deliberately loose: one @, a non-empty local part and a dotted domain.
// Real deliverability is proven by the verification flow itself.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex must compile")
});

/// Check whether a target address looks like a deliverable email address.
pub fn is_valid_email(address: &str) -> bool {
    address.len() <= 254 && EMAIL_REGEX.is_match(address)
}

/// Mask an address for logs and audit metadata, e.g. `a***@example.com`.
pub fn mask_email(address: &str) -> String {
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{first}***@{domain}")
        }
        _ => "***".to_string(),
    }
}
