//! Hosted repository paths and where they live on disk.
//!
//! A repository path such as `admin`, `users/alice` or `acme/team/payments`
//! maps to the bare repository `<root>/<path>.git`.

use std::path::{Path, PathBuf};

use crate::error::TypeError;

const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Validate a repository path such as `admin` or `acme/payments`.
pub fn validate_repo_path(path: &str) -> Result<(), TypeError> {
    let err = |reason: &str| TypeError::InvalidRepoPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(err("path must not be empty"));
    }
    for component in path.split('/') {
        if component.is_empty() {
            return Err(err("path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(err("path components must not start with '.'"));
        }
        if component.contains(FORBIDDEN_CHARS) {
            return Err(err("path contains a forbidden character"));
        }
    }
    if path.ends_with(".git") {
        return Err(err("path must not end with '.git'"));
    }
    Ok(())
}

/// The bare repository directory of `repo` below `root`.
pub fn git_dir(root: &Path, repo: &str) -> Result<PathBuf, TypeError> {
    validate_repo_path(repo)?;
    Ok(root.join(format!("{repo}.git")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_repo_paths() {
        assert!(validate_repo_path("admin").is_ok());
        assert!(validate_repo_path("orgs/acme").is_ok());
        assert!(validate_repo_path("acme/team/payments").is_ok());
    }

    #[test]
    fn reject_bad_repo_paths() {
        for path in ["", "/admin", "acme//x", "../etc", "acme/.git", "acme/a b", "admin.git"] {
            assert!(validate_repo_path(path).is_err(), "{path:?} should be rejected");
        }
    }

    #[test]
    fn git_dir_appends_suffix() {
        let root = Path::new("/srv/git");
        assert_eq!(
            git_dir(root, "users/alice").unwrap(),
            PathBuf::from("/srv/git/users/alice.git")
        );
        assert!(matches!(
            git_dir(root, "../x"),
            Err(TypeError::InvalidRepoPath { .. })
        ));
    }
}
