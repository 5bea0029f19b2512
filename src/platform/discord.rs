use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{BotUser, ChannelKind, Channel, ChatPlatform, Guild, PermissionOverwrite};
use crate::config::DiscordConfig;
use crate::error::PlatformError;

/// Page size for `GET /users/@me/guilds` (API maximum)
const GUILD_PAGE_LIMIT: usize = 200;

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/chain-stats-bot, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Discord REST API client implementing [`ChatPlatform`]
pub struct DiscordPlatform {
    client: Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct GuildWithCounts {
    #[serde(default)]
    approximate_member_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl DiscordPlatform {
    pub fn new(config: &DiscordConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &DiscordConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, path);
        self.client
            .request(method, &url)
            .header("Authorization", format!("Bot {}", self.token))
            .header("User-Agent", USER_AGENT)
    }

    /// Send a request, mapping non-success statuses to `PlatformError::Api`.
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, PlatformError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|body| body.message)
                .unwrap_or(error_text);
            return Err(PlatformError::Api { status, message });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, PlatformError> {
        let body = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn current_user(&self) -> Result<BotUser, PlatformError> {
        self.send_json(self.request(Method::GET, "/users/@me")).await
    }

    async fn guilds(&self) -> Result<Vec<Guild>, PlatformError> {
        let mut guilds: Vec<Guild> = Vec::new();

        loop {
            let mut request = self
                .request(Method::GET, "/users/@me/guilds")
                .query(&[("limit", GUILD_PAGE_LIMIT.to_string())]);
            if let Some(last) = guilds.last() {
                request = request.query(&[("after", last.id.as_str())]);
            }

            let page: Vec<Guild> = self.send_json(request).await?;
            let page_len = page.len();
            guilds.extend(page);

            if page_len < GUILD_PAGE_LIMIT {
                break;
            }
        }

        debug!(count = guilds.len(), "Listed guilds");
        Ok(guilds)
    }

    async fn member_count(&self, guild: &Guild) -> Result<u64, PlatformError> {
        let request = self
            .request(Method::GET, &format!("/guilds/{}", guild.id))
            .query(&[("with_counts", "true")]);
        let details: GuildWithCounts = self.send_json(request).await?;

        details
            .approximate_member_count
            .ok_or_else(|| PlatformError::Decode("approximate_member_count missing".to_string()))
    }

    async fn channels(&self, guild: &Guild) -> Result<Vec<Channel>, PlatformError> {
        self.send_json(self.request(Method::GET, &format!("/guilds/{}/channels", guild.id)))
            .await
    }

    async fn create_category(&self, guild: &Guild, name: &str) -> Result<Channel, PlatformError> {
        let body = json!({
            "name": name,
            "type": u8::from(ChannelKind::Category),
        });
        self.send_json(
            self.request(Method::POST, &format!("/guilds/{}/channels", guild.id))
                .json(&body),
        )
        .await
    }

    async fn create_voice_channel(
        &self,
        guild: &Guild,
        category_id: &str,
        name: &str,
    ) -> Result<Channel, PlatformError> {
        let body = json!({
            "name": name,
            "type": u8::from(ChannelKind::Voice),
            "parent_id": category_id,
        });
        self.send_json(
            self.request(Method::POST, &format!("/guilds/{}/channels", guild.id))
                .json(&body),
        )
        .await
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), PlatformError> {
        self.send(
            self.request(Method::PATCH, &format!("/channels/{}", channel_id))
                .json(&json!({ "name": name })),
        )
        .await?;
        Ok(())
    }

    async fn set_overwrite(
        &self,
        channel_id: &str,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), PlatformError> {
        let body = json!({
            "type": overwrite.kind,
            "allow": overwrite.allow,
            "deny": overwrite.deny,
        });
        self.send(
            self.request(
                Method::PUT,
                &format!("/channels/{}/permissions/{}", channel_id, overwrite.id),
            )
            .json(&body),
        )
        .await?;
        Ok(())
    }
}
