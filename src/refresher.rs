//! Periodic refresh of the stat channels
//!
//! One tick walks every community the bot is in, one after another. For each
//! community the network stats are fetched, the stats category and its voice
//! channels are found or created, every channel is renamed to show its
//! current value, and finally connecting is denied to the default role on
//! every voice channel in the category.
//!
//! Failures never leave a community's cycle: a failed fetch shows up as the
//! placeholder, a failed channel call is logged and skipped.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{Config, RefreshConfig, SourcesConfig};
use crate::gate::MutationGate;
use crate::platform::{
    find_category, find_stat_channel, BotUser, Channel, ChatPlatform, Guild, PermissionOverwrite,
};
use crate::stats::{MetricValue, StatLabel, StatReadings, StatsFetcher};

/// What happened to one community during one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub guild_id: String,
    /// Explorer/exchange fetches that failed
    pub fetch_failures: usize,
    pub category_created: bool,
    pub channels_created: usize,
    pub channels_renamed: usize,
    pub channels_locked: usize,
    /// Platform calls that failed and were skipped
    pub platform_failures: usize,
}

/// Outcome of one tick over all communities
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub cycles: Vec<CycleReport>,
    pub elapsed: Duration,
}

pub struct StatsRefresher {
    platform: Arc<dyn ChatPlatform>,
    sources: SourcesConfig,
    refresh: RefreshConfig,
    gate: MutationGate,
}

impl StatsRefresher {
    pub fn new(platform: Arc<dyn ChatPlatform>, config: &Config) -> Self {
        Self {
            platform,
            sources: config.sources.clone(),
            refresh: config.refresh.clone(),
            gate: MutationGate::new(config.refresh.mutation_interval()),
        }
    }

    /// Readiness check. The timer must not start before this succeeds.
    pub async fn ready(&self) -> Result<BotUser, crate::error::PlatformError> {
        let user = self.platform.current_user().await?;
        info!(user = %user.username, id = %user.id, "Bot is ready");
        Ok(user)
    }

    /// Run ticks forever at the configured interval, the first one
    /// immediately. A slow tick pushes the next one back rather than
    /// triggering a burst.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.refresh.interval_seconds,
            mutation_interval_secs = self.gate.min_interval().as_secs(),
            "Starting stats refresher"
        );

        let mut timer = interval(self.refresh.interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            self.run_tick().await;
        }
    }

    /// Refresh every community once, sequentially.
    pub async fn run_tick(&mut self) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport::default();

        let guilds = match self.platform.guilds().await {
            Ok(guilds) => guilds,
            Err(e) => {
                error!(error = %e, "Failed to list guilds, skipping this tick");
                report.elapsed = started.elapsed();
                return report;
            }
        };

        for guild in &guilds {
            info!(guild = %guild.name, guild_id = %guild.id, "Updating stats for guild");
            report.cycles.push(self.refresh_guild(guild).await);
        }

        report.elapsed = started.elapsed();
        info!(
            guilds = report.cycles.len(),
            elapsed_secs = report.elapsed.as_secs_f64(),
            "Update completed"
        );
        report
    }

    /// Fetch, render and publish the stats of one community.
    pub async fn refresh_guild(&mut self, guild: &Guild) -> CycleReport {
        let mut report = CycleReport {
            guild_id: guild.id.clone(),
            ..Default::default()
        };

        let stats = StatsFetcher::new(&self.sources).fetch_all().await;
        report.fetch_failures = stats.failure_count();

        let members = match self.platform.member_count(guild).await {
            Ok(count) => MetricValue::Numeric(count as f64),
            Err(e) => {
                warn!(guild_id = %guild.id, error = %e, "Failed to read member count");
                MetricValue::Missing
            }
        };

        let readings = StatReadings::from_stats(&stats, members);
        self.publish(guild, &readings, &mut report).await;

        debug!(?report, "Guild cycle finished");
        report
    }

    /// Push already-computed readings into the community's stat channels.
    pub async fn publish(&mut self, guild: &Guild, readings: &StatReadings, report: &mut CycleReport) {
        let mut channels = match self.platform.channels(guild).await {
            Ok(channels) => channels,
            Err(e) => {
                error!(guild_id = %guild.id, error = %e, "Failed to list channels");
                report.platform_failures += 1;
                return;
            }
        };

        let Some(category) = self.resolve_category(guild, &mut channels, report).await else {
            return;
        };

        for (label, name) in readings.channel_names(&self.refresh.supply_unit) {
            info!(stat = %label, value = %readings.get(label), "Updating stat channel");

            let Some(channel_id) = self
                .resolve_channel(guild, &category, label, &mut channels, report)
                .await
            else {
                continue;
            };

            self.gate.acquire().await;
            match self.platform.rename_channel(&channel_id, &name).await {
                Ok(()) => {
                    report.channels_renamed += 1;
                    if let Some(channel) = channels.iter_mut().find(|c| c.id == channel_id) {
                        channel.name = name;
                    }
                }
                Err(e) => {
                    error!(channel = %name, error = %e, "Failed to rename channel");
                    report.platform_failures += 1;
                }
            }
        }

        self.lock_category(guild, &category, channels, report).await;
    }

    async fn resolve_category(
        &mut self,
        guild: &Guild,
        channels: &mut Vec<Channel>,
        report: &mut CycleReport,
    ) -> Option<Channel> {
        let name = &self.refresh.category_name;
        if let Some(category) = find_category(channels, name) {
            return Some(category.clone());
        }

        info!(category = %name, guild_id = %guild.id, "Creating stats category");
        self.gate.acquire().await;
        match self.platform.create_category(guild, name).await {
            Ok(category) => {
                report.category_created = true;
                channels.push(category.clone());
                Some(category)
            }
            Err(e) => {
                error!(category = %name, error = %e, "Failed to create stats category");
                report.platform_failures += 1;
                None
            }
        }
    }

    async fn resolve_channel(
        &mut self,
        guild: &Guild,
        category: &Channel,
        label: StatLabel,
        channels: &mut Vec<Channel>,
        report: &mut CycleReport,
    ) -> Option<String> {
        if let Some(channel) = find_stat_channel(channels, &category.id, label.label()) {
            return Some(channel.id.clone());
        }

        info!(stat = %label, "Creating stat channel");
        self.gate.acquire().await;
        match self
            .platform
            .create_voice_channel(guild, &category.id, label.label())
            .await
        {
            Ok(channel) => {
                report.channels_created += 1;
                let id = channel.id.clone();
                channels.push(channel);
                Some(id)
            }
            Err(e) => {
                error!(stat = %label, error = %e, "Failed to create stat channel");
                report.platform_failures += 1;
                None
            }
        }
    }

    /// Deny CONNECT to the default role on every voice channel currently in
    /// the category, whether or not it was touched this cycle.
    async fn lock_category(
        &self,
        guild: &Guild,
        category: &Channel,
        known: Vec<Channel>,
        report: &mut CycleReport,
    ) {
        let channels = match self.platform.channels(guild).await {
            Ok(channels) => channels,
            Err(e) => {
                warn!(error = %e, "Failed to re-list channels, locking the ones seen this cycle");
                report.platform_failures += 1;
                known
            }
        };

        let role_id = guild.default_role_id();
        for channel in channels.iter().filter(|c| c.is_voice_in(&category.id)) {
            let overwrite = PermissionOverwrite::deny_connect(role_id, channel.overwrite_for(role_id));
            match self.platform.set_overwrite(&channel.id, &overwrite).await {
                Ok(()) => report.channels_locked += 1,
                Err(e) => {
                    error!(channel = %channel.name, error = %e, "Failed to set channel private");
                    report.platform_failures += 1;
                }
            }
        }
    }
}

