//! Dancecast - networked dance-practice video receiver
//!
//! `dancecast receiver` registers with the server's command channel and plays
//! whatever a sender loads on a headless software clock; `dancecast catalog`
//! lists the server's videos.

mod catalog;
mod cli;
mod headless;
mod logging_setup;
mod receiver;

use anyhow::{Context, Result};
use cli::Command;
use dancecast_core::{ClientConfig, DebugParams};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let command = cli::parse(pico_args::Arguments::from_env())?;
    let Some(common) = command.common() else {
        print!("{}", cli::USAGE);
        return Ok(());
    };

    let mut config =
        ClientConfig::load(common.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(common.server.clone(), None);
    config.validate().context("Invalid configuration")?;

    let _log_guard = logging_setup::init(&config.log)?;
    info!("Dancecast {} using server {}", env!("CARGO_PKG_VERSION"), config.origin());

    match command {
        Command::Receiver { name, url, .. } => {
            receiver::run(&config, DebugParams { url, name }).await
        }
        Command::Catalog { .. } => catalog::run(&config).await,
        Command::Help => Ok(()),
    }
}
