#![allow(clippy::arc_with_non_send_sync)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use voicesop::{
    app,
    cli::{handle_documents_command, handle_quota_command, Cli, CliCommand},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("VoiceSOP {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Documents { owner }) => {
            handle_documents_command(&owner)?;
            return Ok(());
        }
        Some(CliCommand::Quota { owner }) => {
            handle_quota_command(&owner)?;
            return Ok(());
        }
        None => {}
    }

    app::run_service().await
}
