//! Checks a freshly loaded configuration must pass before a push that
//! changes it is accepted.
//!
//! Checks run in order and stop at the first failure:
//!
//! 1. `admins` -- at least one global admin remains
//! 2. `keys` -- no key is claimed by two users
//! 3. `identity` -- the pushing key still resolves to the pushing user
//! 4. `authority` -- that user can still write the repository being pushed

use std::collections::BTreeMap;

use gitdir_crypto::{Fingerprint, PublicKey};
use tracing::debug;

use crate::error::ValidationError;
use crate::lookup::RepoLookup;
use crate::model::{AccessLevel, Configuration, User};

/// The push a configuration is being validated for.
pub struct PushContext<'a> {
    /// The user resolved under the configuration currently in force.
    pub user: &'a User,
    /// The key the push was authenticated with.
    pub key: &'a PublicKey,
    /// The repository being pushed.
    pub lookup: &'a RepoLookup,
}

/// A single validation check.
pub trait ConfigCheck: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Err` carries the reason the check failed.
    fn check(&self, config: &Configuration, push: &PushContext<'_>) -> Result<(), String>;
}

/// The configuration must keep at least one global admin.
pub struct AdminsCheck;

impl AdminsCheck {
    fn has_admins(config: &Configuration) -> Result<(), String> {
        if config.admins.is_empty() {
            Err("configuration has no global admins".into())
        } else {
            Ok(())
        }
    }
}

impl ConfigCheck for AdminsCheck {
    fn name(&self) -> &'static str {
        "admins"
    }

    fn check(&self, config: &Configuration, _push: &PushContext<'_>) -> Result<(), String> {
        Self::has_admins(config)
    }
}

/// Every key fingerprint must belong to at most one user.
///
/// Without this a user could list somebody else's public key in their own
/// repository and take over that key's identity.
pub struct KeysCheck;

impl KeysCheck {
    /// Fingerprints listed by more than one user, with the users claiming
    /// them in name order.
    pub fn shared_keys(config: &Configuration) -> BTreeMap<Fingerprint, Vec<String>> {
        let mut owners: BTreeMap<Fingerprint, Vec<String>> = BTreeMap::new();
        for user in config.users.values() {
            for fingerprint in user.keys.keys() {
                owners.entry(*fingerprint).or_default().push(user.name.clone());
            }
        }
        owners.retain(|_, users| users.len() > 1);
        owners
    }
}

impl ConfigCheck for KeysCheck {
    fn name(&self) -> &'static str {
        "keys"
    }

    fn check(&self, config: &Configuration, _push: &PushContext<'_>) -> Result<(), String> {
        match Self::shared_keys(config).into_iter().next() {
            None => Ok(()),
            Some((fingerprint, users)) => Err(format!(
                "key {fingerprint} is claimed by more than one user: {}",
                users.join(", ")
            )),
        }
    }
}

/// The pushing key must still identify the pushing user.
pub struct IdentityCheck;

impl ConfigCheck for IdentityCheck {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn check(&self, config: &Configuration, push: &PushContext<'_>) -> Result<(), String> {
        match resolve_without_anonymous(config, push.key) {
            Some(user) if user.name == push.user.name => Ok(()),
            Some(user) => Err(format!(
                "key {} now belongs to {} instead of {}",
                push.key.fingerprint(),
                user.name,
                push.user.name
            )),
            None => Err(format!(
                "key {} would no longer identify {}",
                push.key.fingerprint(),
                push.user.name
            )),
        }
    }
}

/// The pushing user must keep write access to the pushed repository.
pub struct AuthorityCheck;

impl ConfigCheck for AuthorityCheck {
    fn name(&self) -> &'static str {
        "authority"
    }

    fn check(&self, config: &Configuration, push: &PushContext<'_>) -> Result<(), String> {
        let Some(user) = resolve_without_anonymous(config, push.key) else {
            return Err(format!("{} is not a known user", push.user.name));
        };
        let level = config.access_level(user, push.lookup);
        if level >= AccessLevel::ReadWrite {
            Ok(())
        } else {
            Err(format!(
                "{} would be left with {level} access to the {} repository",
                user.name, push.lookup.kind
            ))
        }
    }
}

/// The single user owning `key`; `None` if no user or several users list it.
fn resolve_without_anonymous<'c>(config: &'c Configuration, key: &PublicKey) -> Option<&'c User> {
    let fingerprint = key.fingerprint();
    let mut found = None;
    let mut matches = 0usize;
    for user in config.users.values() {
        if user.keys.contains_key(&fingerprint) {
            matches += 1;
            found.get_or_insert(user);
        }
    }
    found.filter(|_| matches == 1)
}

/// An ordered, fail-fast list of checks.
pub struct Validator {
    checks: Vec<Box<dyn ConfigCheck>>,
}

impl Validator {
    /// An empty validator. Use [`Self::add_check`] to add checks.
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn add_check(&mut self, check: Box<dyn ConfigCheck>) {
        self.checks.push(check);
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Run every check in order, stopping at the first failure.
    pub fn run(&self, config: &Configuration, push: &PushContext<'_>) -> Result<(), ValidationError> {
        for check in &self.checks {
            let outcome = check.check(config, push);
            debug!(check = check.name(), passed = outcome.is_ok(), "validation check");
            if let Err(reason) = outcome {
                return Err(ValidationError {
                    check: check.name(),
                    reason,
                });
            }
        }
        Ok(())
    }
}

impl Default for Validator {
    /// admins -> keys -> identity -> authority
    fn default() -> Self {
        let mut validator = Self::new();
        validator.add_check(Box::new(AdminsCheck));
        validator.add_check(Box::new(KeysCheck));
        validator.add_check(Box::new(IdentityCheck));
        validator.add_check(Box::new(AuthorityCheck));
        validator
    }
}

impl Configuration {
    /// Validate this configuration as the result of a push by `user`
    /// authenticated with `key` to the repository described by `lookup`.
    pub fn validate(
        &self,
        user: &User,
        key: &PublicKey,
        lookup: &RepoLookup,
    ) -> Result<(), ValidationError> {
        Validator::default().run(self, &PushContext { user, key, lookup })
    }

    /// The push-independent part of validation.
    pub fn validate_admins(&self) -> Result<(), ValidationError> {
        AdminsCheck::has_admins(self).map_err(|reason| ValidationError {
            check: AdminsCheck.name(),
            reason,
        })
    }
}
