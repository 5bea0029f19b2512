#![allow(dead_code)]

use async_trait::async_trait;
use chain_stats_bot::config::{Config, DiscordConfig, RefreshConfig, SourcesConfig};
use chain_stats_bot::error::PlatformError;
use chain_stats_bot::platform::{
    BotUser, Channel, ChannelKind, ChatPlatform, Guild, PermissionOverwrite,
};
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::time::Instant;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const CATEGORY: &str = "Yerbas Server Stats";

/// 记录一次平台写操作
#[derive(Debug, Clone)]
pub struct Mutation {
    pub op: &'static str,
    pub target: String,
    pub at: Instant,
}

#[derive(Default)]
struct FakeState {
    guilds: Vec<Guild>,
    channels: HashMap<String, Vec<Channel>>,
    member_counts: HashMap<String, u64>,
    next_id: u64,
    mutations: Vec<Mutation>,
    fail_guild_list: bool,
    fail_category_create: bool,
    fail_rename_prefix: HashSet<String>,
}

/// 内存中的聊天平台，用于测试刷新流程
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_guild(&self, id: &str, name: &str, members: u64) -> Guild {
        let guild = Guild {
            id: id.to_string(),
            name: name.to_string(),
        };
        let mut state = self.state.lock().unwrap();
        state.guilds.push(guild.clone());
        state.channels.entry(id.to_string()).or_default();
        state.member_counts.insert(id.to_string(), members);
        guild
    }

    /// Guild without a readable member count
    pub fn add_guild_without_count(&self, id: &str, name: &str) -> Guild {
        let guild = self.add_guild(id, name, 0);
        self.state.lock().unwrap().member_counts.remove(id);
        guild
    }

    pub fn add_channel(&self, guild_id: &str, kind: ChannelKind, name: &str, parent: Option<&str>) -> Channel {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let channel = Channel {
            id: format!("c{}", state.next_id),
            kind,
            name: name.to_string(),
            parent_id: parent.map(str::to_string),
            permission_overwrites: vec![],
        };
        state
            .channels
            .entry(guild_id.to_string())
            .or_default()
            .push(channel.clone());
        channel
    }

    pub fn add_overwrite(&self, channel_id: &str, overwrite: PermissionOverwrite) {
        let mut state = self.state.lock().unwrap();
        for channel in state.channels.values_mut().flatten() {
            if channel.id == channel_id {
                channel.permission_overwrites.push(overwrite.clone());
            }
        }
    }

    pub fn channels_of(&self, guild_id: &str) -> Vec<Channel> {
        self.state
            .lock()
            .unwrap()
            .channels
            .get(guild_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Names of the voice channels under the stats category, in creation order
    pub fn stat_channel_names(&self, guild_id: &str) -> Vec<String> {
        let channels = self.channels_of(guild_id);
        let Some(category) = channels
            .iter()
            .find(|c| c.kind == ChannelKind::Category && c.name == CATEGORY)
        else {
            return vec![];
        };
        channels
            .iter()
            .filter(|c| c.is_voice_in(&category.id))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn fail_guild_list(&self) {
        self.state.lock().unwrap().fail_guild_list = true;
    }

    pub fn fail_category_create(&self) {
        self.state.lock().unwrap().fail_category_create = true;
    }

    /// Renames to a name starting with `prefix` will fail
    pub fn fail_rename(&self, prefix: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_rename_prefix
            .insert(prefix.to_string());
    }

    fn record(state: &mut FakeState, op: &'static str, target: &str) {
        state.mutations.push(Mutation {
            op,
            target: target.to_string(),
            at: Instant::now(),
        });
    }

    fn api_error(message: &str) -> PlatformError {
        PlatformError::Api {
            status: StatusCode::FORBIDDEN,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn current_user(&self) -> Result<BotUser, PlatformError> {
        Ok(BotUser {
            id: "999".to_string(),
            username: "stats-bot".to_string(),
        })
    }

    async fn guilds(&self) -> Result<Vec<Guild>, PlatformError> {
        let state = self.state.lock().unwrap();
        if state.fail_guild_list {
            return Err(Self::api_error("guild list unavailable"));
        }
        Ok(state.guilds.clone())
    }

    async fn member_count(&self, guild: &Guild) -> Result<u64, PlatformError> {
        self.state
            .lock()
            .unwrap()
            .member_counts
            .get(&guild.id)
            .copied()
            .ok_or_else(|| PlatformError::Decode("approximate_member_count missing".to_string()))
    }

    async fn channels(&self, guild: &Guild) -> Result<Vec<Channel>, PlatformError> {
        Ok(self.channels_of(&guild.id))
    }

    async fn create_category(&self, guild: &Guild, name: &str) -> Result<Channel, PlatformError> {
        if self.state.lock().unwrap().fail_category_create {
            return Err(Self::api_error("Missing Permissions"));
        }
        let channel = self.add_channel(&guild.id, ChannelKind::Category, name, None);
        Self::record(&mut self.state.lock().unwrap(), "create_category", name);
        Ok(channel)
    }

    async fn create_voice_channel(
        &self,
        guild: &Guild,
        category_id: &str,
        name: &str,
    ) -> Result<Channel, PlatformError> {
        let channel = self.add_channel(&guild.id, ChannelKind::Voice, name, Some(category_id));
        Self::record(&mut self.state.lock().unwrap(), "create_voice", name);
        Ok(channel)
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_rename_prefix.iter().any(|p| name.starts_with(p.as_str())) {
            return Err(Self::api_error("rate limited"));
        }
        let channel = state
            .channels
            .values_mut()
            .flatten()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| Self::api_error("Unknown Channel"))?;
        channel.name = name.to_string();
        Self::record(&mut state, "rename", name);
        Ok(())
    }

    async fn set_overwrite(
        &self,
        channel_id: &str,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        let channel = state
            .channels
            .values_mut()
            .flatten()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| Self::api_error("Unknown Channel"))?;
        channel.permission_overwrites.retain(|o| o.id != overwrite.id);
        channel.permission_overwrites.push(overwrite.clone());
        Self::record(&mut state, "set_overwrite", channel_id);
        Ok(())
    }
}

/// 创建测试用的 Config
///
/// # 参数
/// - `explorer_url`: 区块浏览器 mock 服务器 URL
/// - `exchange_url`: 交易所 mock 接口完整 URL
/// - `mutation_interval_seconds`: 两次频道写操作之间的最小间隔
pub fn test_config(explorer_url: &str, exchange_url: &str, mutation_interval_seconds: u64) -> Config {
    Config {
        discord: DiscordConfig {
            token: "test-token".to_string(),
            api_base: "http://127.0.0.1:1/api/v10".to_string(),
        },
        sources: SourcesConfig {
            explorer_url: explorer_url.to_string(),
            exchange_url: exchange_url.to_string(),
            request_timeout_seconds: 5,
        },
        refresh: RefreshConfig {
            mutation_interval_seconds,
            category_name: CATEGORY.to_string(),
            ..RefreshConfig::default()
        },
    }
}

pub const MARKET_PATH: &str = "/api/v2/market/getbysymbol/yerb_usdt";

/// 设置区块浏览器和交易所 mock：所有接口都返回正常数据
pub async fn setup_sources_mock() -> MockServer {
    let server = MockServer::start().await;
    mount_text(&server, "/api/getdifficulty", "123456.789").await;
    mount_text(&server, "/api/getnetworkhashps", "2500000000\n").await;
    mount_text(&server, "/api/getblockcount", "1234567").await;
    mount_text(&server, "/ext/getmoneysupply", "25000000000.4").await;
    Mock::given(method("GET"))
        .and(path(MARKET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": "YERB/USDT",
            "lastPrice": "0.00012345",
            "volume": "1000000",
        })))
        .mount(&server)
        .await;
    server
}

pub async fn mount_text(server: &MockServer, endpoint: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub fn market_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), MARKET_PATH)
}

pub const EXPECTED_NAMES: [&str; 8] = [
    "Members: 4,321",
    "Difficulty: 123,456.78900000",
    "Hashrate: 2.50 Gh/s",
    "Block: 1,234,567",
    "Supply: 25,000,000,000 YERB",
    "Price: $ 0.00012345",
    "24h Volume: $ 123.45",
    "Market Cap: $ 3,086,250.00",
];
