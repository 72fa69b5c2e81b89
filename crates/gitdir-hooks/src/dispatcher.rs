//! The hook state machine.
//!
//! Each invocation stands alone: it loads the configuration currently in
//! force, resolves who is pushing and what they may do, and then either
//! accepts or rejects. Nothing is carried from one invocation to the next.

use std::io::{BufReader, Read};

use gitdir_config::{
    AccessError, AccessLevel, ConfigLoader, Configuration, HashOverrides, RepoAccess, RepoType,
    User,
};
use gitdir_crypto::PublicKey;
use gitdir_types::ObjectId;
use tracing::{debug, info, info_span};

use crate::error::{HookError, HookResult};
use crate::kind::HookKind;
use crate::update::read_updates;

/// One hook invocation as received from git.
#[derive(Clone, Debug)]
pub struct HookRequest {
    /// Hook name, e.g. `update`.
    pub hook: String,
    /// Repository path the push targets.
    pub repo_path: String,
    /// Key the session authenticated with.
    pub key: PublicKey,
    /// User name the transport connection was made as.
    pub transport_user: String,
    /// Positional hook arguments.
    pub args: Vec<String>,
}

/// Positional arguments of the `update` hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateArgs {
    pub reference: String,
    pub old: ObjectId,
    pub new: ObjectId,
}

impl UpdateArgs {
    /// Parse `[ref, old, new]`. Extra arguments are ignored.
    pub fn parse(args: &[String]) -> HookResult<Self> {
        let [reference, old, new, ..] = args else {
            return Err(HookError::Structural("not enough args".into()));
        };
        let hash = |which: &str, value: &str| {
            ObjectId::from_hex(value)
                .map_err(|e| HookError::Structural(format!("invalid {which} hash {value:?}: {e}")))
        };
        Ok(Self {
            reference: reference.clone(),
            old: hash("old", old)?,
            new: hash("new", new)?,
        })
    }
}

/// Who is pushing where, under the configuration currently in force.
struct Session {
    config: Configuration,
    user: User,
    access: RepoAccess,
}

/// Runs hooks against configuration read through a [`ConfigLoader`].
pub struct HookDispatcher<'a> {
    loader: ConfigLoader<'a>,
}

impl<'a> HookDispatcher<'a> {
    pub fn new(loader: ConfigLoader<'a>) -> Self {
        Self { loader }
    }

    /// Run one hook. `Ok` accepts the push; any error rejects it.
    pub fn run_hook(&self, request: &HookRequest, stdin: &mut dyn Read) -> HookResult<()> {
        let kind: HookKind = request.hook.parse()?;
        let span = info_span!("hook", hook = %kind, repo = %request.repo_path);
        let _enter = span.enter();

        match kind {
            HookKind::PreReceive | HookKind::PostReceive => {
                let session = self.open_session(request)?;
                let updates = read_updates(BufReader::new(stdin))?;
                info!(
                    user = %session.user.name,
                    level = %session.access.level,
                    updates = updates.len(),
                    "accepted"
                );
                Ok(())
            }
            HookKind::Update => {
                let args = UpdateArgs::parse(&request.args)?;
                let session = self.open_session(request)?;
                self.run_update(&session, &request.key, &args)
            }
        }
    }

    fn open_session(&self, request: &HookRequest) -> HookResult<Session> {
        let config = self.loader.load_current()?;
        let user = config.lookup_user_by_key(&request.key, &request.transport_user)?;
        let access = config.lookup_repo_access(&user, &request.repo_path)?;
        debug!(user = %user.name, level = %access.level, kind = %access.lookup.kind, "session");
        Ok(Session {
            config,
            user,
            access,
        })
    }

    fn run_update(&self, session: &Session, key: &PublicKey, args: &UpdateArgs) -> HookResult<()> {
        let Session {
            config,
            user,
            access,
        } = session;

        if access.level < AccessLevel::ReadWrite {
            debug!(user = %user.name, level = %access.level, "write refused");
            return Err(AccessError::AccessDenied.into());
        }

        let none = HashOverrides::new();
        let pushed = match (access.lookup.kind, access.lookup.components.as_slice()) {
            (RepoType::Admin, _) => self.loader.load(args.new, &none, &none)?,
            (RepoType::OrgConfig, [org]) => {
                let orgs = HashOverrides::from([(org.clone(), args.new)]);
                self.loader.load(config.hashes.admin, &orgs, &none)?
            }
            (RepoType::UserConfig, [name]) => {
                let users = HashOverrides::from([(name.clone(), args.new)]);
                self.loader.load(config.hashes.admin, &none, &users)?
            }
            _ => {
                info!(
                    user = %user.name,
                    reference = %args.reference,
                    "accepted"
                );
                return Ok(());
            }
        };

        pushed.validate(user, key, &access.lookup)?;
        info!(
            user = %user.name,
            reference = %args.reference,
            old = %args.old.short_hex(),
            new = %args.new.short_hex(),
            "accepted configuration update"
        );
        Ok(())
    }
}
