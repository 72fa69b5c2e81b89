use std::fmt;
use std::str::FromStr;

use crate::error::HookError;

/// The git hooks gitdir installs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    PreReceive,
    Update,
    PostReceive,
}

impl HookKind {
    pub const ALL: [HookKind; 3] = [Self::PreReceive, Self::Update, Self::PostReceive];

    /// The name git invokes the hook by.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreReceive => "pre-receive",
            Self::Update => "update",
            Self::PostReceive => "post-receive",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookKind {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| HookError::NotImplemented(s.to_string()))
    }
}
