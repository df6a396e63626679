use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, ChannelKind, GuildId, MessageId, UserSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: ChannelId,
    pub guild_id: GuildId,
    pub kind: ChannelKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChannelId>,
}

impl ChannelSummary {
    pub fn is_voice(&self) -> bool {
        self.kind == ChannelKind::Voice
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStateSnapshot {
    pub guild_id: GuildId,
    pub user: UserSummary,
    /// `None` once the user has left voice entirely.
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
}

/// Live view of a guild as cached by the gateway at the moment an event was delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSnapshot {
    pub guild_id: GuildId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channels: Vec<ChannelSummary>,
    #[serde(default)]
    pub voice_states: Vec<VoiceStateSnapshot>,
}

impl GuildSnapshot {
    pub fn channel(&self, channel_id: ChannelId) -> Option<&ChannelSummary> {
        self.channels
            .iter()
            .find(|channel| channel.channel_id == channel_id)
    }

    pub fn contains_channel(&self, channel_id: ChannelId) -> bool {
        self.channel(channel_id).is_some()
    }

    pub fn occupant_count(&self, channel_id: ChannelId) -> usize {
        self.voice_states
            .iter()
            .filter(|state| state.channel_id == Some(channel_id))
            .count()
    }

    pub fn voice_channels_under(
        &self,
        parent_id: ChannelId,
    ) -> impl Iterator<Item = &ChannelSummary> + '_ {
        self.channels
            .iter()
            .filter(move |channel| channel.is_voice() && channel.parent_id == Some(parent_id))
    }

    pub fn voice_state_for(&self, user: &UserSummary) -> Option<&VoiceStateSnapshot> {
        self.voice_states
            .iter()
            .find(|state| state.user.user_id == user.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: GuildId,
    pub author: UserSummary,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GatewayEvent {
    GuildReady {
        guild: GuildSnapshot,
    },
    VoiceStateUpdate {
        state: VoiceStateSnapshot,
        guild: GuildSnapshot,
    },
    ChannelDelete {
        channel: ChannelSummary,
    },
    MessageCreate {
        message: IncomingMessage,
        guild: GuildSnapshot,
    },
}

impl GatewayEvent {
    pub fn guild_id(&self) -> GuildId {
        match self {
            Self::GuildReady { guild } => guild.guild_id,
            Self::VoiceStateUpdate { guild, .. } => guild.guild_id,
            Self::ChannelDelete { channel } => channel.guild_id,
            Self::MessageCreate { guild, .. } => guild.guild_id,
        }
    }
}
