//! On-disk TOML shapes of the admin and organization config files.
//!
//! These mirror the files exactly; the loader turns them into the
//! [`model`](crate::model) types after checking every name they mention.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::{AccessLevel, Options};

/// `config.toml` in the admin repository.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AdminFile {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub users: BTreeMap<String, UserEntry>,
    #[serde(default)]
    pub orgs: BTreeMap<String, OrgEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UserEntry {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Bootstrap admins and members declared from the admin repository.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OrgEntry {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// `config.toml` in an organization's config repository.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OrgFile {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub repos: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RuleEntry {
    pub pattern: String,
    #[serde(default = "default_members")]
    pub members: AccessLevel,
    #[serde(default)]
    pub everyone: AccessLevel,
}

fn default_members() -> AccessLevel {
    AccessLevel::ReadWrite
}

/// Key lines of a `*.pub` file: blank lines and `#` comments dropped.
pub(crate) fn key_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}
