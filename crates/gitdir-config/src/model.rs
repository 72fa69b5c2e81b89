//! The resolved access-control model.
//!
//! Every value here is built fresh by the [`ConfigLoader`](crate::ConfigLoader)
//! and never mutated afterwards; a push is checked against a whole new
//! [`Configuration`], not a patched copy of the old one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use gitdir_crypto::{Fingerprint, PublicKey};
use gitdir_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::layout::Layout;
use crate::pattern::Pattern;

// ---------------------------------------------------------------------------
// AccessLevel
// ---------------------------------------------------------------------------

/// Access granted to an identity on a repository, ordered from least to most.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AccessLevel {
    #[default]
    None,
    Read,
    ReadWrite,
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::ReadWrite => "read-write",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "read" => Ok(Self::Read),
            "read-write" => Ok(Self::ReadWrite),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown access level: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Server-wide options from the admin scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Transport-level user allowed to fall back to anonymous access.
    pub git_user: String,
    /// Whether unknown keys connecting as `git_user` get anonymous read.
    pub anonymous_read: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            git_user: "git".into(),
            anonymous_read: false,
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user identity with its authorized keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Unique name; also the name of the user's config repository.
    pub name: String,
    /// Authorized keys, indexed by fingerprint.
    pub keys: BTreeMap<Fingerprint, PublicKey>,
    /// Organizations this user administers or belongs to.
    pub orgs: BTreeSet<String>,
    /// Set only on the synthetic identity used for anonymous reads.
    pub anonymous: bool,
}

impl User {
    /// A named user with no keys.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: BTreeMap::new(),
            orgs: BTreeSet::new(),
            anonymous: false,
        }
    }

    /// The synthetic anonymous identity.
    pub fn anonymous() -> Self {
        Self {
            anonymous: true,
            ..Self::new("anonymous")
        }
    }

    /// Add a key; duplicates collapse onto one fingerprint.
    pub fn add_key(&mut self, key: PublicKey) {
        self.keys.insert(key.fingerprint(), key);
    }

    pub fn has_key(&self, key: &PublicKey) -> bool {
        self.keys.contains_key(&key.fingerprint())
    }
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

/// Access rule for repositories inside an organization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoRule {
    /// Pattern over the repository path inside the organization.
    pub pattern: Pattern,
    /// Level granted to organization members.
    pub members: AccessLevel,
    /// Level granted to every identity, including anonymous.
    pub everyone: AccessLevel,
}

/// An organization and its repository rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Organization {
    pub name: String,
    pub admins: BTreeSet<String>,
    pub members: BTreeSet<String>,
    /// Rules in declaration order.
    pub repos: Vec<RepoRule>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admins: BTreeSet::new(),
            members: BTreeSet::new(),
            repos: Vec::new(),
        }
    }

    pub fn is_admin(&self, user: &str) -> bool {
        self.admins.contains(user)
    }

    /// Admins count as members.
    pub fn is_member(&self, user: &str) -> bool {
        self.members.contains(user) || self.is_admin(user)
    }

    /// The most specific rule matching `repo`; the earliest declared rule
    /// wins among equally specific ones.
    pub fn rule_for(&self, repo: &str) -> Option<&RepoRule> {
        let mut best: Option<&RepoRule> = None;
        for rule in self.repos.iter().filter(|r| r.pattern.matches(repo)) {
            let better = match best {
                Some(current) => rule.pattern.specificity_cmp(&current.pattern).is_gt(),
                None => true,
            };
            if better {
                best = Some(rule);
            }
        }
        best
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The hashes a configuration was loaded from. Absent scopes are omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeHashes {
    pub admin: ObjectId,
    pub orgs: BTreeMap<String, ObjectId>,
    pub users: BTreeMap<String, ObjectId>,
}

/// A fully resolved access-control configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    pub layout: Layout,
    /// Global admins.
    pub admins: BTreeSet<String>,
    pub orgs: BTreeMap<String, Organization>,
    pub users: BTreeMap<String, User>,
    pub options: Options,
    pub hashes: ScopeHashes,
}

impl Configuration {
    /// A configuration with nothing declared, as loaded from a zero admin hash.
    pub fn empty(layout: Layout) -> Self {
        Self {
            layout,
            admins: BTreeSet::new(),
            orgs: BTreeMap::new(),
            users: BTreeMap::new(),
            options: Options::default(),
            hashes: ScopeHashes::default(),
        }
    }

    pub fn is_admin(&self, user: &User) -> bool {
        !user.anonymous && self.admins.contains(&user.name)
    }

    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    pub fn org(&self, name: &str) -> Option<&Organization> {
        self.orgs.get(name)
    }
}
