//! Naming rules for users and organizations.
//!
//! A name doubles as a repository path component (`users/<name>`,
//! `orgs/<name>`, `<org>/<repo>`), so the rules keep it safe to use as one:
//!
//! - Must be non-empty and at most [`MAX_NAME_LEN`] bytes
//! - Must start with an ASCII letter or digit
//! - May only contain ASCII letters, digits, `_`, `.` and `-`
//! - Must not contain `..`
//! - Must not end with `.git` or `.lock`

use crate::error::TypeError;

/// Longest accepted user or organization name, in bytes.
pub const MAX_NAME_LEN: usize = 64;

fn invalid(name: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a user or organization name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use gitdir_types::validate_name;
///
/// assert!(validate_name("alice").is_ok());
/// assert!(validate_name("acme-corp").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("../etc").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(
            name,
            format!("name must be at most {MAX_NAME_LEN} bytes"),
        ));
    }

    let first = name.as_bytes()[0];
    if !first.is_ascii_alphanumeric() {
        return Err(invalid(name, "must start with a letter or digit"));
    }

    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    for suffix in [".git", ".lock"] {
        if name.ends_with(suffix) {
            return Err(invalid(name, format!("must not end with '{suffix}'")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("alice").is_ok());
        assert!(validate_name("acme-corp").is_ok());
        assert!(validate_name("team_42").is_ok());
        assert!(validate_name("v1.0").is_ok());
        assert!(validate_name("0day").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        assert!(validate_name("").is_err());
    }

    #[test]
    fn reject_bad_first_character() {
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("-flag").is_err());
        assert!(validate_name("_private").is_err());
    }

    #[test]
    fn reject_path_characters() {
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name("a\\b").is_err());
        assert!(validate_name("a:b").is_err());
    }

    #[test]
    fn reject_double_dot() {
        assert!(validate_name("a..b").is_err());
    }

    #[test]
    fn reject_reserved_suffixes() {
        assert!(validate_name("repo.git").is_err());
        assert!(validate_name("main.lock").is_err());
    }

    #[test]
    fn reject_overlong_name() {
        let long = "a".repeat(MAX_NAME_LEN + 1);
        let err = validate_name(&long).unwrap_err();
        assert!(matches!(err, TypeError::InvalidName { .. }));
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
    }
}
