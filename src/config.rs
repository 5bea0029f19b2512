use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the bot credential
pub const TOKEN_ENV_VAR: &str = "DISCORD_BOT_TOKEN";

/// Prefix for environment overrides, e.g. `STATS_BOT__REFRESH__INTERVAL_SECONDS`
pub const ENV_PREFIX: &str = "STATS_BOT";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    /// Bot token; normally supplied through `DISCORD_BOT_TOKEN`
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Block explorer base URL
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    /// Exchange market summary URL
    #[serde(default = "default_exchange_url")]
    pub exchange_url: String,

    /// Per-request timeout in seconds; 0 (the default) leaves the HTTP
    /// client default in place
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_seconds > 0).then(|| Duration::from_secs(self.request_timeout_seconds))
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            explorer_url: default_explorer_url(),
            exchange_url: default_exchange_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    /// Seconds between ticks (default: 300 = 5 minutes)
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// Minimum seconds between two channel mutations (default: 15)
    #[serde(default = "default_mutation_interval_seconds")]
    pub mutation_interval_seconds: u64,

    /// Category holding the stat channels
    #[serde(default = "default_category_name")]
    pub category_name: String,

    /// Unit appended to the supply value
    #[serde(default = "default_supply_unit")]
    pub supply_unit: String,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn mutation_interval(&self) -> Duration {
        Duration::from_secs(self.mutation_interval_seconds)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            mutation_interval_seconds: default_mutation_interval_seconds(),
            category_name: default_category_name(),
            supply_unit: default_supply_unit(),
        }
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_explorer_url() -> String {
    "https://explorer.yerbas.org".to_string()
}

fn default_exchange_url() -> String {
    "https://api.xeggex.com/api/v2/market/getbysymbol/yerb_usdt".to_string()
}

fn default_request_timeout() -> u64 {
    0
}

fn default_interval_seconds() -> u64 {
    300
}

fn default_mutation_interval_seconds() -> u64 {
    15
}

fn default_category_name() -> String {
    "Yerbas Server Stats".to_string()
}

fn default_supply_unit() -> String {
    "YERB".to_string()
}

/// Load configuration: built-in defaults, then the optional file at `path`,
/// then `STATS_BOT__*` environment overrides. The token falls back to
/// `DISCORD_BOT_TOKEN` when not set by either.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let mut cfg: Config = config.try_deserialize()?;
    if cfg.discord.token.is_empty() {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            cfg.discord.token = token.trim().to_string();
        }
    }
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.discord.token.trim().is_empty() {
        anyhow::bail!("Bot token is not set (set {} or discord.token)", TOKEN_ENV_VAR);
    }

    if cfg.refresh.interval_seconds == 0 {
        anyhow::bail!("refresh.interval_seconds must be > 0");
    }

    if cfg.refresh.category_name.trim().is_empty() {
        anyhow::bail!("refresh.category_name cannot be empty");
    }

    validate_url("discord.api_base", &cfg.discord.api_base)?;
    validate_url("sources.explorer_url", &cfg.sources.explorer_url)?;
    validate_url("sources.exchange_url", &cfg.sources.exchange_url)?;

    Ok(())
}

fn validate_url(field: &str, value: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(value)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL ({}): {}", field, value, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("{} must use http or https, got '{}'", field, url.scheme());
    }
    Ok(())
}
