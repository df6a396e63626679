use std::sync::Arc;

use shared::{
    domain::{ChannelId, UserSummary},
    protocol::{GuildSnapshot, IncomingMessage},
};
use tracing::{debug, info};

use crate::{
    config::CategorySettings, engine::log_line, error::AllowNotFound,
    invite_ledger::RecordOutcome, CrewEngine,
};

/// `!i [message...]`: broadcast an invite to the caller's current crew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteCommand {
    pub message: Option<String>,
}

impl InviteCommand {
    pub fn parse(prefix: &str, content: &str) -> Option<Self> {
        let rest = content.trim().strip_prefix(prefix)?;
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let message = rest.trim();
        Some(Self {
            message: (!message.is_empty()).then(|| message.to_string()),
        })
    }
}

struct AlertRequest {
    voice_channel_id: ChannelId,
    alert_channel_id: ChannelId,
    alert_channel_name: String,
    requester: UserSummary,
    message: Option<String>,
    log_channel: Option<ChannelId>,
    settings: CategorySettings,
}

impl CrewEngine {
    pub async fn on_message_create(&self, message: &IncomingMessage, guild: &GuildSnapshot) {
        let Some(command) = InviteCommand::parse(&self.config.command_prefix, &message.content)
        else {
            return;
        };
        self.on_invite_command(message, guild, command).await;
    }

    pub async fn on_invite_command(
        &self,
        message: &IncomingMessage,
        guild: &GuildSnapshot,
        command: InviteCommand,
    ) {
        let api = Arc::clone(&self.api);
        let (command_channel_id, command_message_id) = (message.channel_id, message.message_id);
        self.dispatcher.spawn("delete_command_message", async move {
            api.delete_message(command_channel_id, command_message_id)
                .await
                .allow_not_found()?;
            Ok(())
        });

        let Some(voice_channel) = guild
            .voice_state_for(&message.author)
            .and_then(|state| state.channel_id)
            .and_then(|channel_id| guild.channel(channel_id))
        else {
            debug!(
                user_id = message.author.user_id.0,
                "crews: invite requested outside of a voice channel"
            );
            return;
        };
        let Some(category_id) = voice_channel.parent_id else {
            return;
        };

        let managed = self
            .state
            .lock()
            .await
            .registry
            .is_managed_category(guild.guild_id, category_id);
        if !managed {
            return;
        }

        let settings = self.config.settings_for(category_id);
        if !settings.alert_allowed_channels.contains(&message.channel_id) {
            debug!(
                channel_id = message.channel_id.0,
                category_id = category_id.0,
                "crews: invites are not allowed in this channel"
            );
            return;
        }

        let alert_channel_name = guild
            .channel(message.channel_id)
            .map(|channel| channel.name.clone())
            .unwrap_or_default();
        let log_channel = settings
            .log_channel
            .filter(|log_channel| guild.contains_channel(*log_channel));

        self.spawn_alert(AlertRequest {
            voice_channel_id: voice_channel.channel_id,
            alert_channel_id: message.channel_id,
            alert_channel_name,
            requester: message.author.clone(),
            message: command.message,
            log_channel,
            settings,
        });
    }

    fn spawn_alert(&self, request: AlertRequest) {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        self.dispatcher.spawn("send_alert", async move {
            let AlertRequest {
                voice_channel_id,
                alert_channel_id,
                alert_channel_name,
                requester,
                message,
                log_channel,
                settings,
            } = request;

            let code = api
                .create_invite(voice_channel_id, settings.alert_invite_max_age)
                .await?;
            let link = settings.invite_link(&code);
            let content = settings.render_alert(&requester.mention(), &link, message.as_deref());
            let log_msg = match &message {
                Some(text) => format!(
                    "Sending invite {code}, requested by {requester} for channel {alert_channel_name} (#{alert_channel_id}), with custom message:\n```{text}```"
                ),
                None => format!(
                    "Sending invite {code}, requested by {requester} for channel {alert_channel_name} (#{alert_channel_id}) without custom message"
                ),
            };
            info!(
                voice_channel_id = voice_channel_id.0,
                alert_channel_id = alert_channel_id.0,
                user_id = requester.user_id.0,
                invite = %code,
                "crews: sending invite"
            );

            let message_id = api.send_message(alert_channel_id, &content).await?;
            let outcome =
                state
                    .lock()
                    .await
                    .invites
                    .record_invite(voice_channel_id, alert_channel_id, message_id);
            match outcome {
                RecordOutcome::Tracked {
                    superseded: Some(previous),
                } => {
                    api.delete_message(alert_channel_id, previous)
                        .await
                        .allow_not_found()?;
                }
                RecordOutcome::Tracked { superseded: None } => {}
                RecordOutcome::ChannelGone => {
                    info!(
                        voice_channel_id = voice_channel_id.0,
                        message_id = message_id.0,
                        "crews: crew was deleted while inviting, withdrawing invite"
                    );
                    api.delete_message(alert_channel_id, message_id)
                        .await
                        .allow_not_found()?;
                    return Ok(());
                }
            }

            if let Some(log_channel) = log_channel {
                api.send_message(log_channel, &log_line(&log_msg)).await?;
            }
            Ok(())
        });
    }
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
