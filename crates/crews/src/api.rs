use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{ChannelId, GuildId, MessageId},
    error::ApiException,
    protocol::ChannelSummary,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl ChannelEdit {
    pub fn position(position: i64) -> Self {
        Self {
            name: None,
            position: Some(position),
        }
    }

    pub fn rename(name: impl Into<String>, position: i64) -> Self {
        Self {
            name: Some(name.into()),
            position: Some(position),
        }
    }
}

/// Outbound REST surface of the chat platform.
///
/// Every call may fail with an [`ApiException`]; a `NotFound` code means the target
/// is already gone and callers that only want it gone treat that as success.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn create_voice_channel(
        &self,
        guild_id: GuildId,
        parent_id: ChannelId,
        name: &str,
        user_limit: Option<u32>,
    ) -> Result<ChannelSummary, ApiException>;

    async fn modify_channel(
        &self,
        channel_id: ChannelId,
        edit: ChannelEdit,
    ) -> Result<(), ApiException>;

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), ApiException>;

    /// Returns the invite code.
    async fn create_invite(
        &self,
        channel_id: ChannelId,
        max_age_secs: u64,
    ) -> Result<String, ApiException>;

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, ApiException>;

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), ApiException>;
}
