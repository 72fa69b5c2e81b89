use gitdir_config::{AccessError, ConfigError, ValidationError};

/// Why a hook rejected an invocation.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The hook was invoked with malformed arguments.
    #[error("{0}")]
    Structural(String),

    /// The hook name is not one gitdir handles.
    #[error("hook {0} is not implemented")]
    NotImplemented(String),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unknown identity or insufficient access.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The pushed configuration failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Reading the hook's stdin failed.
    #[error("reading hook input: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for hook results.
pub type HookResult<T> = Result<T, HookError>;
