//! Repository path classification.

use gitdir_types::validate_name;

use crate::layout::Layout;

/// What kind of repository a path names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepoType {
    /// The admin repository.
    Admin,
    /// `<orgs>/<org>`: an organization's config repository.
    OrgConfig,
    /// `<users>/<user>`: a user's config repository.
    UserConfig,
    /// `<org>/<repo...>`: an ordinary repository inside an organization.
    OrgRepo,
    /// Anything else.
    Invalid,
}

impl RepoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::OrgConfig => "org-config",
            Self::UserConfig => "user-config",
            Self::OrgRepo => "org-repo",
            Self::Invalid => "invalid",
        }
    }

    /// Pushes to these repositories change the configuration itself.
    pub fn holds_config(&self) -> bool {
        matches!(self, Self::Admin | Self::OrgConfig | Self::UserConfig)
    }
}

impl std::fmt::Display for RepoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified repository path.
///
/// `components` is empty for `Admin` and `Invalid`, `[name]` for the config
/// repositories and `[org, repo...]` for organization repositories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoLookup {
    pub kind: RepoType,
    pub components: Vec<String>,
}

impl RepoLookup {
    fn new(kind: RepoType, components: &[&str]) -> Self {
        Self {
            kind,
            components: components.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn invalid() -> Self {
        Self::new(RepoType::Invalid, &[])
    }
}

/// Classify a repository path as sent by a git client.
///
/// A single leading `/` and a trailing `.git` are ignored. Never fails:
/// unrecognized paths are [`RepoType::Invalid`].
pub fn classify(layout: &Layout, path: &str) -> RepoLookup {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix(".git").unwrap_or(path);

    if path == layout.admin_repo {
        return RepoLookup::new(RepoType::Admin, &[]);
    }

    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().any(|part| validate_name(part).is_err()) {
        return RepoLookup::invalid();
    }

    match parts.as_slice() {
        [ns, name] if *ns == layout.org_namespace => {
            if layout.is_reserved(name) {
                RepoLookup::invalid()
            } else {
                RepoLookup::new(RepoType::OrgConfig, &[*name])
            }
        }
        [ns, name] if *ns == layout.user_namespace => {
            if layout.is_reserved(name) {
                RepoLookup::invalid()
            } else {
                RepoLookup::new(RepoType::UserConfig, &[*name])
            }
        }
        [org, rest @ ..] if !rest.is_empty() && !layout.is_reserved(org) => {
            RepoLookup::new(RepoType::OrgRepo, &parts)
        }
        _ => RepoLookup::invalid(),
    }
}
