//! Ref name and repository path validation following git-style conventions.
//!
//! Valid ref names:
//! - Must start with `refs/` and have at least one component after it
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` or `@{`
//! - Must not end with `/`, `.` or `.lock`
//! - Components between slashes must be non-empty and not start with `.`
//!
//! Repository paths follow [`gitdir_types::validate_repo_path`].

use gitdir_types::TypeError;

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidRefName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a full ref name such as `refs/heads/main`.
///
/// # Examples
///
/// ```
/// use gitdir_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("refs/heads/main").is_ok());
/// assert!(validate_ref_name("refs/heads/feature/auth").is_ok());
/// assert!(validate_ref_name("main").is_err());
/// assert!(validate_ref_name("refs/heads/bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<()> {
    let Some(rest) = name.strip_prefix("refs/") else {
        return Err(invalid(name, "must start with 'refs/'"));
    };
    if rest.is_empty() {
        return Err(invalid(name, "must name a ref below 'refs/'"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
        }
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }

    if name.ends_with('/') || name.ends_with('.') {
        return Err(invalid(name, "must not end with '/' or '.'"));
    }

    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    for component in rest.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }

    Ok(())
}

/// Validate a repository path such as `admin` or `acme/payments`.
pub fn validate_repo_path(path: &str) -> Result<()> {
    gitdir_types::validate_repo_path(path).map_err(|e| RefError::InvalidRepoPath {
        path: path.to_string(),
        reason: match e {
            TypeError::InvalidRepoPath { reason, .. } => reason,
            other => other.to_string(),
        },
    })
}
