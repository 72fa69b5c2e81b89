use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};

use crate::cli::{Cli, LogFormat};

/// Process settings resolved once at startup and passed down explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    /// Absolute, existing directory holding `objects/` and `repos/`.
    pub base_dir: PathBuf,
    pub log_format: LogFormat,
    pub debug: bool,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        Ok(Self {
            base_dir: resolve_base_dir(&cli.base_dir)?,
            log_format: cli.log_format,
            debug: cli.debug,
        })
    }
}

fn resolve_base_dir(path: &Path) -> anyhow::Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("resolving base dir {}", path.display()))?;
    let metadata = std::fs::metadata(&absolute)
        .with_context(|| format!("reading base dir {}", absolute.display()))?;
    ensure!(
        metadata.is_dir(),
        "base dir {} is not a directory",
        absolute.display()
    );
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use clap::Parser;

    fn cli(base: &Path) -> Cli {
        let argv: Vec<OsString> = vec![
            "gitdir".into(),
            "--base-dir".into(),
            base.as_os_str().to_owned(),
            "--log-format".into(),
            "console".into(),
            "check".into(),
        ];
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn existing_directory_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::from_cli(&cli(dir.path())).unwrap();
        assert!(config.base_dir.is_absolute());
        assert_eq!(config.log_format, LogFormat::Console);
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::from_cli(&cli(&dir.path().join("missing"))).is_err());
    }

    #[test]
    fn file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();
        let err = CliConfig::from_cli(&cli(&file)).unwrap_err();
        assert!(err.to_string().contains("not a directory"), "{err}");
    }

    #[test]
    fn relative_path_is_made_absolute() {
        let resolved = resolve_base_dir(Path::new(".")).unwrap();
        assert!(resolved.is_absolute());
    }
}
