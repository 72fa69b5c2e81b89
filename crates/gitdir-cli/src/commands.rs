use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::Context;
use gitdir_config::{classify, AccessError, AccessLevel, ConfigLoader, Configuration, HashOverrides};
use gitdir_crypto::PublicKey;
use gitdir_hooks::{HookDispatcher, HookRequest};
use gitdir_refs::GitRefStore;
use gitdir_store::GitObjectStore;
use tracing::{debug, info, warn};

use crate::cli::*;
use crate::config::CliConfig;

/// The bare repositories under the base directory.
struct Stores {
    objects: GitObjectStore,
    refs: GitRefStore,
}

impl Stores {
    fn open(base_dir: &Path) -> Self {
        Self {
            objects: GitObjectStore::open(base_dir),
            refs: GitRefStore::open(base_dir),
        }
    }

    /// Make the objects of an in-flight push to `repo` readable.
    fn quarantined(&self, repo: &str, objects_dir: &Path) -> Self {
        debug!(repo, dir = %objects_dir.display(), "reading quarantined objects");
        Self {
            objects: self.objects.clone().with_quarantine(repo, objects_dir),
            refs: self.refs.clone(),
        }
    }

    fn loader(&self) -> ConfigLoader<'_> {
        ConfigLoader::new(&self.objects, &self.refs)
    }
}

pub fn run_command(config: &CliConfig, command: Command) -> anyhow::Result<()> {
    let stores = Stores::open(&config.base_dir);
    let mut out = io::stdout().lock();
    match command {
        Command::Hook(args) => cmd_hook(&stores, args, &mut io::stdin().lock()),
        Command::Check(args) => cmd_check(&stores, args, &mut out),
        Command::Access(args) => cmd_access(&stores, args, &mut out),
    }
}

fn parse_key(line: &str) -> anyhow::Result<PublicKey> {
    PublicKey::parse_authorized_key(line).context("parsing presented key")
}

fn cmd_hook(stores: &Stores, args: HookArgs, stdin: &mut dyn Read) -> anyhow::Result<()> {
    let quarantined;
    let stores = match &args.quarantine {
        Some(dir) => {
            quarantined = stores.quarantined(&args.repo, dir);
            &quarantined
        }
        None => stores,
    };
    let request = HookRequest {
        hook: args.name,
        repo_path: args.repo,
        key: parse_key(&args.key)?,
        transport_user: args.user,
        args: args.args,
    };
    let dispatcher = HookDispatcher::new(stores.loader());
    if let Err(e) = dispatcher.run_hook(&request, stdin) {
        warn!(hook = %request.hook, repo = %request.repo_path, error = %e, "rejected");
        return Err(e.into());
    }
    Ok(())
}

fn cmd_check(stores: &Stores, args: CheckArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let loader = stores.loader();
    let admin = match args.admin {
        Some(id) => id,
        None => loader.current_admin_hash()?,
    };
    let none = HashOverrides::new();
    let config = loader
        .load(admin, &none, &none)
        .with_context(|| format!("loading configuration at admin commit {}", admin.short_hex()))?;
    config.validate_admins()?;
    info!(admin = %admin.short_hex(), orgs = config.orgs.len(), users = config.users.len(), "configuration ok");
    write_summary(&config, out)?;
    Ok(())
}

fn write_summary(config: &Configuration, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "admin commit: {}", config.hashes.admin)?;
    let admins: Vec<&str> = config.admins.iter().map(String::as_str).collect();
    writeln!(out, "admins: {}", admins.join(", "))?;
    writeln!(out, "users: {}", config.users.len())?;
    for (name, org) in &config.orgs {
        let at = config
            .hashes
            .orgs
            .get(name)
            .map(|id| id.short_hex())
            .unwrap_or_else(|| "unpublished".into());
        writeln!(
            out,
            "org {name} ({at}): {} admins, {} members, {} repo rules",
            org.admins.len(),
            org.members.len(),
            org.repos.len()
        )?;
    }
    if config.options.anonymous_read {
        writeln!(out, "anonymous read enabled")?;
    }
    Ok(())
}

fn cmd_access(stores: &Stores, args: AccessArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = stores.loader().load_current()?;
    let key = parse_key(&args.key)?;
    let user = config.lookup_user_by_key(&key, &args.user)?;
    let level = match config.lookup_repo_access(&user, &args.repo) {
        Ok(access) => access.level,
        Err(AccessError::AccessDenied) => AccessLevel::None,
        Err(e) => return Err(e.into()),
    };
    let kind = classify(&config.layout, &args.repo).kind;

    let who = if user.anonymous {
        format!("{} (anonymous)", user.name)
    } else {
        user.name.clone()
    };
    writeln!(out, "user: {who}")?;
    writeln!(out, "key: {}", key.fingerprint())?;
    writeln!(out, "repo: {} ({kind})", args.repo)?;
    writeln!(out, "access: {level}")?;
    Ok(())
}
