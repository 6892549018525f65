//! Receiver path: the command channel driving the headless surface

use crate::headless::ClockBackend;
use anyhow::{Context, Result};
use dancecast_control::{
    channel_url, origin_string, parse_origin, ChannelDriver, CommandChannel, WsConnector,
};
use dancecast_core::{resolve_media_url, ClientConfig, DebugParams, PlaybackController};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tracing::{info, warn};

/// Run until Ctrl-C
pub async fn run(config: &ClientConfig, debug: DebugParams) -> Result<()> {
    let origin = parse_origin(&config.server).context("Invalid server origin")?;
    let endpoint = channel_url(&origin).context("Invalid channel endpoint")?;
    let origin = origin_string(&origin);
    let name = debug
        .name
        .clone()
        .unwrap_or_else(|| config.display_name.clone());

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let backend = ClockBackend::new(events_tx);
    let ticker = backend.spawn_ticker(Duration::from_millis(config.clock_tick_ms));
    let mut controller = PlaybackController::new(backend);

    let mut channel = CommandChannel::new(endpoint, origin.clone(), name)
        .with_reconnect_delay(Duration::from_millis(config.reconnect_delay_ms));

    if let Some(url) = &debug.url {
        controller.load(&resolve_media_url(&origin, url), 1.0, None);
        channel.override_status(format!("Playing: {url}"));
    }
    info!(status = %channel.status(), "Receiver status");

    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
        }
        signal.notify_one();
    });

    let driver = ChannelDriver::new(WsConnector, channel, controller)
        .run(events_rx, shutdown)
        .await;
    ticker.abort();

    info!(
        registrations = driver.channel().registrations(),
        "Receiver stopped"
    );
    Ok(())
}
