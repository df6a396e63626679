use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use shared::{
    domain::{ChannelId, ChannelKind, GuildId, MessageId, UserId, UserSummary},
    error::{ApiException, ErrorCode},
    protocol::{ChannelSummary, GuildSnapshot, VoiceStateSnapshot},
};
use tokio::sync::mpsc;

use crate::{
    api::{ChannelEdit, ChatApi},
    config::CrewsConfig,
    dispatch::{Dispatcher, TaskFailure},
    engine::{CrewEngine, CrewState},
    name_pool::NamePool,
};

pub(crate) const GUILD: GuildId = GuildId(1);
pub(crate) const CATEGORY: ChannelId = ChannelId(10);
pub(crate) const ALERT_CHANNEL: ChannelId = ChannelId(30);
pub(crate) const LOG_CHANNEL: ChannelId = ChannelId(40);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiCall {
    CreateVoiceChannel {
        parent_id: ChannelId,
        name: String,
        user_limit: Option<u32>,
    },
    ModifyChannel {
        channel_id: ChannelId,
        edit: ChannelEdit,
    },
    DeleteChannel(ChannelId),
    CreateInvite {
        channel_id: ChannelId,
        max_age_secs: u64,
    },
    SendMessage {
        channel_id: ChannelId,
        content: String,
    },
    DeleteMessage {
        channel_id: ChannelId,
        message_id: MessageId,
    },
}

/// In-memory platform double. Ids are handed out from a shared counter starting at
/// 1000; ids marked gone answer deletes with `NotFound`.
pub(crate) struct FakeApi {
    calls: Mutex<Vec<ApiCall>>,
    next_id: AtomicI64,
    gone: Mutex<HashSet<i64>>,
    delete_channel_failure: Mutex<Option<ErrorCode>>,
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1000),
            gone: Mutex::new(HashSet::new()),
            delete_channel_failure: Mutex::new(None),
        })
    }

    pub(crate) fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().expect("calls lock").clear();
    }

    pub(crate) fn mark_gone(&self, id: i64) {
        self.gone.lock().expect("gone lock").insert(id);
    }

    pub(crate) fn fail_channel_deletes(&self, code: ErrorCode) {
        *self.delete_channel_failure.lock().expect("failure lock") = Some(code);
    }

    pub(crate) fn created_channels(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::CreateVoiceChannel { .. }))
            .count()
    }

    pub(crate) fn renames(&self) -> Vec<(ChannelId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::ModifyChannel {
                    channel_id,
                    edit:
                        ChannelEdit {
                            name: Some(name), ..
                        },
                } => Some((channel_id, name)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn deleted_channels(&self) -> Vec<ChannelId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::DeleteChannel(channel_id) => Some(channel_id),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn sent_messages(&self, channel_id: ChannelId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::SendMessage {
                    channel_id: target,
                    content,
                } if target == channel_id => Some(content),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn check_gone(&self, id: i64) -> Result<(), ApiException> {
        if self.gone.lock().expect("gone lock").contains(&id) {
            return Err(ApiException::not_found(format!("unknown resource {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn create_voice_channel(
        &self,
        guild_id: GuildId,
        parent_id: ChannelId,
        name: &str,
        user_limit: Option<u32>,
    ) -> Result<ChannelSummary, ApiException> {
        self.record(ApiCall::CreateVoiceChannel {
            parent_id,
            name: name.to_string(),
            user_limit,
        });
        Ok(ChannelSummary {
            channel_id: ChannelId(self.allocate_id()),
            guild_id,
            kind: ChannelKind::Voice,
            name: name.to_string(),
            parent_id: Some(parent_id),
        })
    }

    async fn modify_channel(
        &self,
        channel_id: ChannelId,
        edit: ChannelEdit,
    ) -> Result<(), ApiException> {
        self.record(ApiCall::ModifyChannel { channel_id, edit });
        self.check_gone(channel_id.0)
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), ApiException> {
        self.record(ApiCall::DeleteChannel(channel_id));
        let failure = *self.delete_channel_failure.lock().expect("failure lock");
        if let Some(code) = failure {
            return Err(ApiException::new(code, "delete refused"));
        }
        self.check_gone(channel_id.0)
    }

    async fn create_invite(
        &self,
        channel_id: ChannelId,
        max_age_secs: u64,
    ) -> Result<String, ApiException> {
        self.record(ApiCall::CreateInvite {
            channel_id,
            max_age_secs,
        });
        Ok(format!("inv{}", self.allocate_id()))
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, ApiException> {
        self.record(ApiCall::SendMessage {
            channel_id,
            content: content.to_string(),
        });
        Ok(MessageId(self.allocate_id()))
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), ApiException> {
        self.record(ApiCall::DeleteMessage {
            channel_id,
            message_id,
        });
        self.check_gone(message_id.0)
    }
}

pub(crate) fn test_config() -> CrewsConfig {
    serde_json::from_value(serde_json::json!({
        "crew_names": ["Alpha", "Beta"],
        "crew_formatter": "Crew {}",
        "new_crew_name": "+ New crew",
        "crew_size": 4,
        "alert_allowed_channels": [ALERT_CHANNEL.0],
        "categories": { "10": {} }
    }))
    .expect("config")
}

pub(crate) fn test_engine(
    api: &Arc<FakeApi>,
    config: CrewsConfig,
) -> (CrewEngine, mpsc::UnboundedReceiver<TaskFailure>) {
    let (dispatcher, failures) = Dispatcher::new();
    let state = CrewState::with_name_pool(NamePool::with_rng(StdRng::seed_from_u64(42)));
    let api: Arc<dyn ChatApi> = api.clone();
    (
        CrewEngine::with_state(api, config, state, dispatcher),
        failures,
    )
}

pub(crate) fn user(id: i64) -> UserSummary {
    UserSummary {
        user_id: UserId(id),
        username: format!("user{id}"),
    }
}

pub(crate) fn category(channel_id: ChannelId) -> ChannelSummary {
    ChannelSummary {
        channel_id,
        guild_id: GUILD,
        kind: ChannelKind::Category,
        name: "Crews".into(),
        parent_id: None,
    }
}

pub(crate) fn text_channel(channel_id: ChannelId) -> ChannelSummary {
    ChannelSummary {
        channel_id,
        guild_id: GUILD,
        kind: ChannelKind::Text,
        name: format!("text-{}", channel_id.0),
        parent_id: Some(CATEGORY),
    }
}

pub(crate) fn voice_channel(channel_id: ChannelId, parent_id: ChannelId) -> ChannelSummary {
    ChannelSummary {
        channel_id,
        guild_id: GUILD,
        kind: ChannelKind::Voice,
        name: format!("voice-{}", channel_id.0),
        parent_id: Some(parent_id),
    }
}

pub(crate) fn in_voice(user_id: i64, channel_id: Option<ChannelId>) -> VoiceStateSnapshot {
    VoiceStateSnapshot {
        guild_id: GUILD,
        user: user(user_id),
        channel_id,
    }
}

/// Guild with the managed category, an alert channel, a log channel and the
/// given extra channels/voice states.
pub(crate) fn guild_with(
    channels: Vec<ChannelSummary>,
    voice_states: Vec<VoiceStateSnapshot>,
) -> GuildSnapshot {
    let mut all = vec![
        category(CATEGORY),
        text_channel(ALERT_CHANNEL),
        text_channel(LOG_CHANNEL),
    ];
    all.extend(channels);
    GuildSnapshot {
        guild_id: GUILD,
        name: "Test guild".into(),
        channels: all,
        voice_states,
    }
}
