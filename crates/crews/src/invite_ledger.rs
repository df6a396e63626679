use std::collections::{HashMap, HashSet, VecDeque};

use shared::domain::{ChannelId, MessageId};

/// How many deleted voice channels are remembered for late invites.
const RETIRED_CAPACITY: usize = 1024;

/// Result of recording a freshly posted invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Now tracked; carries the invite it replaces, which the caller should delete.
    Tracked { superseded: Option<MessageId> },
    /// The voice channel was deleted while the invite was in flight. Nothing was
    /// recorded and the caller should delete the invite it just posted.
    ChannelGone,
}

/// Last invite message posted per (voice channel, alert channel) pair.
#[derive(Debug, Default)]
pub struct InviteLedger {
    entries: HashMap<ChannelId, HashMap<ChannelId, MessageId>>,
    retired: HashSet<ChannelId>,
    retired_order: VecDeque<ChannelId>,
}

impl InviteLedger {
    pub fn record_invite(
        &mut self,
        voice_channel_id: ChannelId,
        alert_channel_id: ChannelId,
        message_id: MessageId,
    ) -> RecordOutcome {
        if self.retired.contains(&voice_channel_id) {
            return RecordOutcome::ChannelGone;
        }
        let superseded = self
            .entries
            .entry(voice_channel_id)
            .or_default()
            .insert(alert_channel_id, message_id)
            .filter(|previous| *previous != message_id);
        RecordOutcome::Tracked { superseded }
    }

    /// Forgets every invite posted for a voice channel and refuses later ones for it.
    pub fn drop_channel(&mut self, voice_channel_id: ChannelId) -> Vec<(ChannelId, MessageId)> {
        if self.retired.insert(voice_channel_id) {
            self.retired_order.push_back(voice_channel_id);
            if self.retired_order.len() > RETIRED_CAPACITY {
                if let Some(oldest) = self.retired_order.pop_front() {
                    self.retired.remove(&oldest);
                }
            }
        }
        let mut stale: Vec<_> = self
            .entries
            .remove(&voice_channel_id)
            .map(|alerts| alerts.into_iter().collect())
            .unwrap_or_default();
        stale.sort();
        stale
    }

    pub fn latest(
        &self,
        voice_channel_id: ChannelId,
        alert_channel_id: ChannelId,
    ) -> Option<MessageId> {
        self.entries
            .get(&voice_channel_id)
            .and_then(|alerts| alerts.get(&alert_channel_id))
            .copied()
    }

    pub fn tracked_channels(&self) -> usize {
        self.entries.len()
    }
}
