use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;
use crate::config::CliConfig;

mod cli;
mod commands;
mod config;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = CliConfig::from_cli(&cli)?;
    init_tracing(&config);
    commands::run_command(&config, cli.command)
}

/// Logs go to stderr; git relays hook stdout to the pushing client.
fn init_tracing(config: &CliConfig) {
    let filter = if config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Console => builder.init(),
    }
}
