use anyhow::Result;
use chain_stats_bot::config::Config;
use chain_stats_bot::platform::DiscordPlatform;
use chain_stats_bot::StatsRefresher;
use std::sync::Arc;

/// Execute the once command: one readiness check, one tick, then exit.
///
/// Fails only if the readiness check fails; per-step failures are reported
/// in the summary like any scheduled tick.
pub async fn execute(cfg: Config) -> Result<()> {
    let platform = Arc::new(DiscordPlatform::new(&cfg.discord));
    let mut refresher = StatsRefresher::new(platform, &cfg);

    refresher
        .ready()
        .await
        .map_err(|e| anyhow::anyhow!("Readiness check failed: {}", e))?;

    let report = refresher.run_tick().await;

    println!("Refreshed {} guild(s) in {:.2}s", report.cycles.len(), report.elapsed.as_secs_f64());
    for cycle in &report.cycles {
        println!(
            "  {}: renamed {}, created {}, locked {}, fetch failures {}, platform failures {}",
            cycle.guild_id,
            cycle.channels_renamed,
            cycle.channels_created,
            cycle.channels_locked,
            cycle.fetch_failures,
            cycle.platform_failures
        );
    }

    Ok(())
}
