use std::sync::Arc;

use chrono::{Local, Utc};
use shared::{
    domain::{ChannelId, ChannelKind, GuildId, UserSummary},
    protocol::{ChannelSummary, GatewayEvent, GuildSnapshot, VoiceStateSnapshot},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    api::{ChannelEdit, ChatApi},
    config::CrewsConfig,
    dispatch::Dispatcher,
    error::AllowNotFound,
    invite_ledger::InviteLedger,
    name_pool::NamePool,
    registry::ChannelRegistry,
};

/// Everything the engine tracks in memory. Rebuilt from live guild state after a
/// restart.
#[derive(Debug, Default)]
pub struct CrewState {
    pub registry: ChannelRegistry,
    pub names: NamePool,
    pub invites: InviteLedger,
}

impl CrewState {
    pub fn with_name_pool(names: NamePool) -> Self {
        Self {
            names,
            ..Self::default()
        }
    }
}

/// Reacts to gateway events and keeps every managed category supplied with exactly
/// one creator channel.
///
/// Handlers update [`CrewState`] before spawning any API work, so the next event
/// already sees the new state even though the spawned calls may finish in any order.
#[derive(Clone)]
pub struct CrewEngine {
    pub(crate) api: Arc<dyn ChatApi>,
    pub(crate) config: Arc<CrewsConfig>,
    pub(crate) state: Arc<Mutex<CrewState>>,
    pub(crate) dispatcher: Dispatcher,
}

impl CrewEngine {
    pub fn new(api: Arc<dyn ChatApi>, config: CrewsConfig, dispatcher: Dispatcher) -> Self {
        Self::with_state(api, config, CrewState::default(), dispatcher)
    }

    pub fn with_state(
        api: Arc<dyn ChatApi>,
        config: CrewsConfig,
        state: CrewState,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            api,
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
            dispatcher,
        }
    }

    pub fn state(&self) -> &Arc<Mutex<CrewState>> {
        &self.state
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn handle_event(&self, event: GatewayEvent) {
        if !self.config.enabled {
            return;
        }
        match event {
            GatewayEvent::GuildReady { guild } => self.on_guild_ready(&guild).await,
            GatewayEvent::VoiceStateUpdate { state, guild } => {
                self.on_voice_state_update(&state, &guild).await
            }
            GatewayEvent::ChannelDelete { channel } => self.on_channel_delete(&channel).await,
            GatewayEvent::MessageCreate { message, guild } => {
                self.on_message_create(&message, &guild).await
            }
        }
    }

    pub async fn on_guild_ready(&self, guild: &GuildSnapshot) {
        let present: Vec<ChannelId> = self
            .config
            .configured_categories()
            .into_iter()
            .filter(|category_id| {
                guild
                    .channel(*category_id)
                    .is_some_and(|channel| channel.kind == ChannelKind::Category)
            })
            .collect();

        let (fresh, subscribed) = {
            let mut state = self.state.lock().await;
            let fresh = state.registry.mark_guild_managed(guild.guild_id, present);
            let subscribed = !fresh.is_empty() && state.registry.subscribe(guild.guild_id);
            (fresh, subscribed)
        };

        if fresh.is_empty() {
            debug!(guild_id = guild.guild_id.0, "crews: no new categories to set up");
            return;
        }

        info!(
            guild_id = guild.guild_id.0,
            guild = %guild.name,
            "crews: setting up voice channels for guild"
        );
        for category_id in fresh {
            let category_name = guild
                .channel(category_id)
                .map(|channel| channel.name.as_str())
                .unwrap_or_default();
            info!(
                category_id = category_id.0,
                category = %category_name,
                "crews: managing category as vocal crew category"
            );

            for channel in guild.voice_channels_under(category_id) {
                if guild.occupant_count(channel.channel_id) == 0 {
                    info!(
                        channel_id = channel.channel_id.0,
                        channel = %channel.name,
                        "crews: deleting unknown voice channel"
                    );
                    self.spawn_delete_channel(channel.channel_id);
                } else {
                    warn!(
                        channel_id = channel.channel_id.0,
                        channel = %channel.name,
                        "crews: leaving non-empty unknown voice channel"
                    );
                }
            }

            self.spawn_creator_provisioning(guild.guild_id, category_id);
        }

        if subscribed {
            info!(
                guild_id = guild.guild_id.0,
                "crews: listening to voice state and channel delete events"
            );
        }
    }

    pub async fn on_voice_state_update(&self, voice: &VoiceStateSnapshot, guild: &GuildSnapshot) {
        let (joined, empty) = {
            let mut state = self.state.lock().await;
            if !state.registry.is_subscribed(guild.guild_id) {
                return;
            }
            // Removing the creator here, before anything is spawned, is what makes a
            // second join on the same channel a no-op.
            let joined = voice.channel_id.and_then(|channel_id| {
                state
                    .registry
                    .remove_creator(channel_id)
                    .map(|category_id| (channel_id, category_id))
            });
            let empty = empty_channels(&state.registry, guild);
            (joined, empty)
        };

        if let Some((channel_id, category_id)) = joined {
            self.spawn_crew_provisioning(guild, channel_id, category_id, voice.user.clone());
            self.spawn_creator_provisioning(guild.guild_id, category_id);
        }

        for channel in empty {
            if joined.is_some_and(|(channel_id, _)| channel_id == channel.channel_id) {
                continue;
            }
            info!(
                channel_id = channel.channel_id.0,
                channel = %channel.name,
                "crews: deleting empty channel"
            );
            self.spawn_delete_channel(channel.channel_id);
        }
    }

    pub async fn on_channel_delete(&self, channel: &ChannelSummary) {
        let (stale, orphaned_category) = {
            let mut state = self.state.lock().await;
            if !state.registry.is_subscribed(channel.guild_id) {
                return;
            }
            (
                state.invites.drop_channel(channel.channel_id),
                state.registry.remove_creator(channel.channel_id),
            )
        };

        for (alert_channel_id, message_id) in stale {
            debug!(
                channel_id = channel.channel_id.0,
                alert_channel_id = alert_channel_id.0,
                message_id = message_id.0,
                "crews: retiring invite of deleted channel"
            );
            let api = Arc::clone(&self.api);
            self.dispatcher.spawn("delete_invite_message", async move {
                api.delete_message(alert_channel_id, message_id)
                    .await
                    .allow_not_found()?;
                Ok(())
            });
        }

        if let Some(category_id) = orphaned_category {
            warn!(
                channel_id = channel.channel_id.0,
                category_id = category_id.0,
                "crews: creator channel was deleted externally, provisioning a replacement"
            );
            self.spawn_creator_provisioning(channel.guild_id, category_id);
        }
    }

    /// Creates a creator channel for `category_id` and registers it once the platform
    /// has assigned it an id.
    pub(crate) fn spawn_creator_provisioning(&self, guild_id: GuildId, category_id: ChannelId) {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let settings = self.config.settings_for(category_id);
        self.dispatcher.spawn("create_creator_channel", async move {
            let creator = api
                .create_voice_channel(
                    guild_id,
                    category_id,
                    &settings.new_crew_name,
                    settings.user_limit(),
                )
                .await?;
            state
                .lock()
                .await
                .registry
                .add_creator(creator.channel_id, category_id);
            info!(
                channel_id = creator.channel_id.0,
                category_id = category_id.0,
                "crews: creator channel ready"
            );
            api.modify_channel(creator.channel_id, ChannelEdit::position(1))
                .await
                .allow_not_found()?;
            Ok(())
        });
    }

    fn spawn_crew_provisioning(
        &self,
        guild: &GuildSnapshot,
        channel_id: ChannelId,
        category_id: ChannelId,
        user: UserSummary,
    ) {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let settings = self.config.settings_for(category_id);
        let log_channel = settings
            .log_channel
            .filter(|log_channel| guild.contains_channel(*log_channel));
        self.dispatcher.spawn("create_crew_channel", async move {
            let chosen = state
                .lock()
                .await
                .names
                .allocate(category_id, &settings.crew_names)?;
            let crew_name = settings.format_crew_name(&chosen);
            let log_msg = format!("Creating Crew \"{crew_name}\" (#{channel_id}) (requested by {user})");
            info!(
                channel_id = channel_id.0,
                category_id = category_id.0,
                crew = %crew_name,
                user_id = user.user_id.0,
                "crews: creating crew"
            );

            api.modify_channel(
                channel_id,
                ChannelEdit::rename(crew_name, Utc::now().timestamp()),
            )
            .await?;
            if let Some(log_channel) = log_channel {
                api.send_message(log_channel, &log_line(&log_msg)).await?;
            }
            Ok(())
        });
    }

    pub(crate) fn spawn_delete_channel(&self, channel_id: ChannelId) {
        let api = Arc::clone(&self.api);
        self.dispatcher.spawn("delete_channel", async move {
            api.delete_channel(channel_id).await.allow_not_found()?;
            Ok(())
        });
    }
}

/// Voice channels under managed categories with nobody in them, creators excluded.
fn empty_channels(registry: &ChannelRegistry, guild: &GuildSnapshot) -> Vec<ChannelSummary> {
    let categories = registry.managed_categories(guild.guild_id);
    guild
        .channels
        .iter()
        .filter(|channel| channel.is_voice() && !registry.is_creator(channel.channel_id))
        .filter(|channel| {
            channel
                .parent_id
                .is_some_and(|parent_id| categories.contains(&parent_id))
        })
        .filter(|channel| guild.occupant_count(channel.channel_id) == 0)
        .cloned()
        .collect()
}

/// Log-channel line, prefixed with the local wall-clock time.
pub(crate) fn log_line(message: &str) -> String {
    format!("[{}] {message}", Local::now().format("%X"))
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
