use anyhow::Result;
use chain_stats_bot::config::Config;
use chain_stats_bot::platform::DiscordPlatform;
use chain_stats_bot::signals::{setup_signal_handlers, ShutdownSignal};
use chain_stats_bot::StatsRefresher;
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

/// Execute the start command
///
/// This will:
/// 1. Check the credential against the platform (readiness)
/// 2. Start the refresh timer
/// 3. Run until SIGTERM/SIGINT
pub async fn execute(cfg: Config) -> Result<()> {
    println!("{}", "Starting stats bot in foreground mode...".green());

    let platform = Arc::new(DiscordPlatform::new(&cfg.discord));
    let refresher = StatsRefresher::new(platform, &cfg);

    refresher
        .ready()
        .await
        .map_err(|e| anyhow::anyhow!("Readiness check failed: {}", e))?;

    let (shutdown_tx, _signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = refresher.run() => {}
        signal = shutdown_rx.recv() => {
            if let Ok(ShutdownSignal::Graceful) = signal {
                info!("Shutdown complete");
            }
        }
    }

    Ok(())
}
