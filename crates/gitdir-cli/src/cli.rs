use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gitdir_types::ObjectId;

#[derive(Parser)]
#[command(
    name = "gitdir",
    about = "Git hosting with access control kept in git",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the object and ref stores.
    #[arg(long, env = "GITDIR_BASE_DIR")]
    pub base_dir: PathBuf,

    #[arg(long, env = "GITDIR_LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,

    #[arg(long, env = "GITDIR_DEBUG")]
    pub debug: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Json,
    Console,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a git hook against the configuration in force
    Hook(HookArgs),
    /// Load and check the configuration
    Check(CheckArgs),
    /// Show the identity and access level a key holds on a repository
    Access(AccessArgs),
}

#[derive(Args)]
pub struct HookArgs {
    /// Hook name as git invokes it
    pub name: String,
    /// Positional hook arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
    /// Repository the push targets
    #[arg(long, env = "GITDIR_REPO")]
    pub repo: String,
    /// Public key line the session authenticated with
    #[arg(long, env = "GITDIR_KEY")]
    pub key: String,
    /// User the transport connection was made as
    #[arg(long, env = "GITDIR_USER", default_value = "git")]
    pub user: String,
    /// Object directory git holds the pushed objects in until the push is
    /// accepted
    #[arg(long, env = "GIT_QUARANTINE_PATH")]
    pub quarantine: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Admin commit to load instead of the current one
    #[arg(long)]
    pub admin: Option<ObjectId>,
}

#[derive(Args)]
pub struct AccessArgs {
    pub repo: String,
    #[arg(long)]
    pub key: String,
    #[arg(long, default_value = "git")]
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["gitdir", "--base-dir", "/srv/git"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parse_hook() {
        let cli = parse(&[
            "hook",
            "--repo",
            "acme/payments",
            "--key",
            "ssh-ed25519 AAAA",
            "update",
            "refs/heads/main",
            "aa",
            "bb",
        ]);
        assert_eq!(cli.base_dir, PathBuf::from("/srv/git"));
        if let Command::Hook(args) = cli.command {
            assert_eq!(args.name, "update");
            assert_eq!(args.args, ["refs/heads/main", "aa", "bb"]);
            assert_eq!(args.repo, "acme/payments");
            assert_eq!(args.user, "git");
            assert_eq!(args.quarantine, None);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_hook_without_args() {
        let cli = parse(&["hook", "--repo", "admin", "--key", "k", "--user", "deploy", "pre-receive"]);
        if let Command::Hook(args) = cli.command {
            assert_eq!(args.name, "pre-receive");
            assert!(args.args.is_empty());
            assert_eq!(args.user, "deploy");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_hook_quarantine() {
        let cli = parse(&[
            "hook",
            "--repo",
            "admin",
            "--key",
            "k",
            "--quarantine",
            "/srv/git/admin.git/objects/tmp_objdir-incoming-x",
            "update",
        ]);
        if let Command::Hook(args) = cli.command {
            assert_eq!(
                args.quarantine,
                Some(PathBuf::from("/srv/git/admin.git/objects/tmp_objdir-incoming-x"))
            );
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_check() {
        let cli = parse(&["check"]);
        assert!(matches!(cli.command, Command::Check(CheckArgs { admin: None })));

        let hex = ObjectId::from_hash([7; 20]).to_hex();
        let cli = parse(&["check", "--admin", &hex]);
        if let Command::Check(args) = cli.command {
            assert_eq!(args.admin, Some(ObjectId::from_hash([7; 20])));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn check_rejects_bad_hash() {
        let result =
            Cli::try_parse_from(["gitdir", "--base-dir", "/srv", "check", "--admin", "xyz"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_access() {
        let cli = parse(&["access", "acme/docs", "--key", "ssh-ed25519 AAAA"]);
        if let Command::Access(args) = cli.command {
            assert_eq!(args.repo, "acme/docs");
            assert_eq!(args.key, "ssh-ed25519 AAAA");
            assert_eq!(args.user, "git");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_log_options() {
        let cli = parse(&["--log-format", "console", "--debug", "check"]);
        assert_eq!(cli.log_format, LogFormat::Console);
        assert!(cli.debug);
    }
}
