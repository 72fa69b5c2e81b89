use std::fmt;

use gitdir_refs::RefError;
use gitdir_store::StoreError;

/// The configuration scope an error was found in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// The admin repository.
    Admin,
    /// An organization's config repository.
    Org(String),
    /// A user's config repository.
    User(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Org(name) => write!(f, "org {name}"),
            Self::User(name) => write!(f, "user {name}"),
        }
    }
}

/// Errors raised while loading a [`Configuration`](crate::Configuration).
///
/// Any error voids the whole load; there is no partial configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A file could not be decoded or parsed.
    #[error("{scope}: {path}: {message}")]
    Parse {
        scope: Scope,
        path: String,
        message: String,
    },

    /// A required file is not present in the scope's tree.
    #[error("{scope}: {path}: missing")]
    Missing { scope: Scope, path: String },

    /// A user or organization name breaks the naming rules.
    #[error("{scope}: invalid name {name:?}: {reason}")]
    InvalidName {
        scope: Scope,
        name: String,
        reason: String,
    },

    /// A reference to a user or organization that is not declared.
    #[error("{scope}: reference to undeclared {kind} {name:?}")]
    Dangling {
        scope: Scope,
        kind: &'static str,
        name: String,
    },

    /// The object store failed while reading a scope.
    #[error("{scope}: {source}")]
    Store {
        scope: Scope,
        #[source]
        source: StoreError,
    },

    /// The ref store failed while resolving a scope's current hash.
    #[error("{scope}: ref lookup failed: {source}")]
    Ref {
        scope: Scope,
        #[source]
        source: RefError,
    },
}

/// Convenience alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Identity or access resolution failure.
///
/// Both variants render as the same message so a client cannot tell an
/// unknown key from a known key without rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The presented key belongs to no user.
    #[error("permission denied")]
    Unauthorized,
    /// The identity holds no access to the repository.
    #[error("permission denied")]
    AccessDenied,
}

/// A configuration that loaded but failed one of the validation checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration ({check}): {reason}")]
pub struct ValidationError {
    /// Name of the failing check (`admins`, `identity`, `authority`).
    pub check: &'static str,
    /// Why it failed.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_errors_are_indistinguishable() {
        assert_eq!(
            AccessError::Unauthorized.to_string(),
            AccessError::AccessDenied.to_string()
        );
        assert_eq!(AccessError::AccessDenied.to_string(), "permission denied");
    }

    #[test]
    fn config_error_names_scope_and_path() {
        let err = ConfigError::Parse {
            scope: Scope::Org("acme".into()),
            path: "config.toml".into(),
            message: "expected a table".into(),
        };
        assert_eq!(err.to_string(), "org acme: config.toml: expected a table");
        assert_eq!(Scope::Admin.to_string(), "admin");
        assert_eq!(Scope::User("bob".into()).to_string(), "user bob");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            check: "admins",
            reason: "no global admins".into(),
        };
        assert_eq!(err.to_string(), "invalid configuration (admins): no global admins");
    }
}
