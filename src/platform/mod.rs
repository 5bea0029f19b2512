//! Chat platform collaborator
//!
//! The refresher only needs a handful of calls: list communities, read a
//! member count, list/create/rename channels and edit one permission
//! overwrite. They are collected in [`ChatPlatform`] so the refresh
//! procedure can run against the real Discord API or an in-memory fake.

pub mod discord;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

pub use discord::DiscordPlatform;

/// `CONNECT` permission bit
pub const CONNECT: u64 = 1 << 20;

/// Overwrite type for roles (members use 1)
pub const OVERWRITE_ROLE: u8 = 0;

/// Identity returned by the readiness check
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

/// A community the bot is connected to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

impl Guild {
    /// The default ("@everyone") role shares the guild's id
    pub fn default_role_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => ChannelKind::Text,
            2 => ChannelKind::Voice,
            4 => ChannelKind::Category,
            other => ChannelKind::Other(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => 0,
            ChannelKind::Voice => 2,
            ChannelKind::Category => 4,
            ChannelKind::Other(other) => other,
        }
    }
}

/// Per-role or per-member permission overwrite on a channel.
///
/// Permission sets travel as decimal strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PermissionOverwrite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default = "zero_bits")]
    pub allow: String,
    #[serde(default = "zero_bits")]
    pub deny: String,
}

fn zero_bits() -> String {
    "0".to_string()
}

impl PermissionOverwrite {
    pub fn allow_bits(&self) -> u64 {
        self.allow.parse().unwrap_or(0)
    }

    pub fn deny_bits(&self) -> u64 {
        self.deny.parse().unwrap_or(0)
    }

    /// Role overwrite for `role_id` with CONNECT denied, keeping every other
    /// bit of `existing`.
    pub fn deny_connect(role_id: &str, existing: Option<&PermissionOverwrite>) -> Self {
        let (allow, deny) = existing
            .map(|o| (o.allow_bits(), o.deny_bits()))
            .unwrap_or((0, 0));

        Self {
            id: role_id.to_string(),
            kind: OVERWRITE_ROLE,
            allow: (allow & !CONNECT).to_string(),
            deny: (deny | CONNECT).to_string(),
        }
    }

    pub fn denies_connect(&self) -> bool {
        self.deny_bits() & CONNECT != 0 && self.allow_bits() & CONNECT == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

impl Channel {
    pub fn is_voice_in(&self, category_id: &str) -> bool {
        self.kind == ChannelKind::Voice && self.parent_id.as_deref() == Some(category_id)
    }

    pub fn overwrite_for(&self, id: &str) -> Option<&PermissionOverwrite> {
        self.permission_overwrites.iter().find(|o| o.id == id)
    }
}

/// Operations the refresher needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Readiness check: who are we connected as
    async fn current_user(&self) -> Result<BotUser, PlatformError>;

    /// Every community the bot is a member of
    async fn guilds(&self) -> Result<Vec<Guild>, PlatformError>;

    async fn member_count(&self, guild: &Guild) -> Result<u64, PlatformError>;

    /// All channels of a community, in platform order
    async fn channels(&self, guild: &Guild) -> Result<Vec<Channel>, PlatformError>;

    async fn create_category(&self, guild: &Guild, name: &str) -> Result<Channel, PlatformError>;

    async fn create_voice_channel(
        &self,
        guild: &Guild,
        category_id: &str,
        name: &str,
    ) -> Result<Channel, PlatformError>;

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), PlatformError>;

    /// Create or replace the overwrite identified by `overwrite.id`
    async fn set_overwrite(
        &self,
        channel_id: &str,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), PlatformError>;
}

/// Normalise a channel name for lookup: lower case, spaces removed.
pub fn normalize_channel_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// First voice channel in `category_id` whose normalised name starts with
/// the normalised `label`.
///
/// Several matches resolve to whichever the platform listed first.
pub fn find_stat_channel<'a>(
    channels: &'a [Channel],
    category_id: &str,
    label: &str,
) -> Option<&'a Channel> {
    let target = normalize_channel_name(label);
    channels
        .iter()
        .filter(|c| c.is_voice_in(category_id))
        .find(|c| normalize_channel_name(&c.name).starts_with(&target))
}

/// Category with exactly `name`
pub fn find_category<'a>(channels: &'a [Channel], name: &str) -> Option<&'a Channel> {
    channels
        .iter()
        .find(|c| c.kind == ChannelKind::Category && c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, name: &str, parent: &str) -> Channel {
        Channel {
            id: id.to_string(),
            kind: ChannelKind::Voice,
            name: name.to_string(),
            parent_id: Some(parent.to_string()),
            permission_overwrites: vec![],
        }
    }

    #[test]
    fn test_normalize_channel_name() {
        assert_eq!(normalize_channel_name("Price: $ 0.1"), "price:$0.1");
        assert_eq!(normalize_channel_name("24h Volume: $"), "24hvolume:$");
    }

    #[test]
    fn test_find_stat_channel_ignores_case_and_spaces() {
        let channels = vec![
            voice("1", "members: 10", "cat"),
            voice("2", "DIFFICULTY:1,234.00000000", "cat"),
            voice("3", "Market  Cap: $ N/A", "cat"),
        ];

        assert_eq!(find_stat_channel(&channels, "cat", "Difficulty:").unwrap().id, "2");
        assert_eq!(find_stat_channel(&channels, "cat", "Members:").unwrap().id, "1");
        assert_eq!(find_stat_channel(&channels, "cat", "Market Cap: $").unwrap().id, "3");
        assert!(find_stat_channel(&channels, "cat", "Block:").is_none());
    }

    #[test]
    fn test_find_stat_channel_scoped_to_category_and_voice() {
        let mut text = voice("1", "Block: 5", "cat");
        text.kind = ChannelKind::Text;
        let channels = vec![text, voice("2", "Block: 5", "other"), voice("3", "Block: 6", "cat")];

        assert_eq!(find_stat_channel(&channels, "cat", "Block:").unwrap().id, "3");
    }

    #[test]
    fn test_find_category_exact_name() {
        let channels = vec![
            Channel {
                id: "10".to_string(),
                kind: ChannelKind::Category,
                name: "yerbas server stats".to_string(),
                parent_id: None,
                permission_overwrites: vec![],
            },
            Channel {
                id: "11".to_string(),
                kind: ChannelKind::Category,
                name: "Yerbas Server Stats".to_string(),
                parent_id: None,
                permission_overwrites: vec![],
            },
        ];
        assert_eq!(find_category(&channels, "Yerbas Server Stats").unwrap().id, "11");
    }

    #[test]
    fn test_deny_connect_keeps_other_bits() {
        let existing = PermissionOverwrite {
            id: "g".to_string(),
            kind: OVERWRITE_ROLE,
            allow: (CONNECT | 1024).to_string(),
            deny: "2048".to_string(),
        };
        let updated = PermissionOverwrite::deny_connect("g", Some(&existing));
        assert_eq!(updated.allow_bits(), 1024);
        assert_eq!(updated.deny_bits(), 2048 | CONNECT);
        assert!(updated.denies_connect());

        let fresh = PermissionOverwrite::deny_connect("g", None);
        assert_eq!(fresh.allow, "0");
        assert_eq!(fresh.deny, CONNECT.to_string());
    }

    #[test]
    fn test_channel_deserialize() {
        let json = r#"{
            "id": "42", "type": 2, "name": "Block: 1", "parent_id": "7",
            "permission_overwrites": [{"id": "1", "type": 0, "allow": "0", "deny": "1048576"}],
            "bitrate": 64000
        }"#;
        let channel: Channel = serde_json::from_str(json).unwrap();
        assert!(channel.is_voice_in("7"));
        assert!(channel.overwrite_for("1").unwrap().denies_connect());

        let category: Channel = serde_json::from_str(r#"{"id": "7", "type": 4, "name": "Stats"}"#).unwrap();
        assert_eq!(category.kind, ChannelKind::Category);
        assert!(category.parent_id.is_none());
    }
}
