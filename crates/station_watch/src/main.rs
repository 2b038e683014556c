//! station_watch: follows the live map feed and logs, for every update, how
//! far each player is from each station.
//!
//! Startup loads the station markers once (and aborts if that fails, since
//! there would be nothing to measure against), optionally dumps them to JSON,
//! then hands over to the reconnecting supervisor until a signal arrives.

mod cli;
mod config;
mod logging;
mod signals;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use station_feed::{fetch_reference_table, fetcher_for, LogReporter, Supervisor, WebSocketReceiver};

use crate::cli::CliArgs;
use crate::config::AppConfig;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .map_err(|e| anyhow!("failed to load {}: {e}", args.config_path.display()))?;
    config.apply_cli(&args);
    config
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {e}"))?;

    logging::setup_logging(&config.logging)?;

    if let Err(e) = run(config).await {
        error!("❌ {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(config: AppConfig) -> Result<()> {
    let feed = config
        .to_feed_config()
        .map_err(|e| anyhow!("Configuration validation failed: {e}"))?;
    info!("🌟 station_watch v{}", env!("CARGO_PKG_VERSION"));
    info!("  📄 Markers: {} ({})", feed.document_locator, feed.declaration);
    info!("  🌐 Stream: {}", feed.stream_target);
    info!(
        "  ⏱️ Reconnect delay: {:.1}s | queue capacity: {}",
        feed.reconnect_delay.as_secs_f64(),
        feed.queue_capacity
    );

    let fetcher = fetcher_for(&feed.document_locator).context("creating document fetcher")?;

    let table = fetch_reference_table(fetcher.as_ref(), &feed.document_locator, &feed.declaration)
        .await
        .context("loading station markers")?;

    if let Some(path) = &feed.output_path {
        table
            .save_pretty(path)
            .await
            .with_context(|| format!("writing markers to {}", path.display()))?;
    }

    let supervisor = Supervisor::new(
        feed.clone(),
        Arc::new(WebSocketReceiver::new(feed.stream_target.clone())),
        fetcher,
        Arc::new(LogReporter),
    );

    let shutdown = CancellationToken::new();
    let supervisor_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { supervisor.run(shutdown).await })
    };

    info!("✅ Watching the live feed; press Ctrl+C to stop");
    let received = signals::wait_for_shutdown().await?;

    info!("📡 Received {}; shutting down", received);
    shutdown.cancel();
    supervisor_handle.await.context("supervisor task failed")?;

    info!("👋 Bye");
    Ok(())
}
