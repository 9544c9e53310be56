//! Email canonicalization.

/// Trim and lower-case `raw`, then check it has a `local@domain.tld` shape.
///
/// Returns `None` for anything that does not pass; a partially normalized
/// value is never handed back.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    is_valid_email(&email).then_some(email)
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }

    if domain.contains('@') || domain.chars().any(char::is_whitespace) {
        return false;
    }

    // Some dot must have at least one character on either side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
