use std::collections::{HashMap, HashSet};

use shared::domain::{ChannelId, GuildId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryPhase {
    Uninitialized,
    /// Managed, but no creator channel is registered yet.
    Initializing,
    Steady,
}

/// Which guilds and categories are managed, and which channels currently act as
/// creator channels.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    guilds: HashMap<GuildId, HashSet<ChannelId>>,
    phases: HashMap<ChannelId, CategoryPhase>,
    creators: HashMap<ChannelId, ChannelId>,
    subscribed: HashSet<GuildId>,
}

impl ChannelRegistry {
    /// Records the guild as known and adds `categories` to its managed set.
    /// Returns the categories that were not managed before, in input order.
    pub fn mark_guild_managed(
        &mut self,
        guild_id: GuildId,
        categories: impl IntoIterator<Item = ChannelId>,
    ) -> Vec<ChannelId> {
        let managed = self.guilds.entry(guild_id).or_default();
        let mut fresh = Vec::new();
        for category_id in categories {
            if managed.insert(category_id) {
                self.phases.insert(category_id, CategoryPhase::Initializing);
                fresh.push(category_id);
            }
        }
        fresh
    }

    pub fn is_managed(&self, guild_id: GuildId) -> bool {
        self.guilds.contains_key(&guild_id)
    }

    pub fn managed_categories(&self, guild_id: GuildId) -> HashSet<ChannelId> {
        self.guilds.get(&guild_id).cloned().unwrap_or_default()
    }

    pub fn is_managed_category(&self, guild_id: GuildId, category_id: ChannelId) -> bool {
        self.guilds
            .get(&guild_id)
            .is_some_and(|categories| categories.contains(&category_id))
    }

    pub fn category_phase(&self, category_id: ChannelId) -> CategoryPhase {
        self.phases
            .get(&category_id)
            .copied()
            .unwrap_or(CategoryPhase::Uninitialized)
    }

    pub fn add_creator(&mut self, channel_id: ChannelId, category_id: ChannelId) {
        self.creators.insert(channel_id, category_id);
        self.phases.insert(category_id, CategoryPhase::Steady);
    }

    /// Returns the category the creator belonged to, or `None` when the channel
    /// was not (or no longer) a creator.
    pub fn remove_creator(&mut self, channel_id: ChannelId) -> Option<ChannelId> {
        let category_id = self.creators.remove(&channel_id)?;
        if self.creator_for(category_id).is_none() {
            self.phases.insert(category_id, CategoryPhase::Initializing);
        }
        Some(category_id)
    }

    pub fn is_creator(&self, channel_id: ChannelId) -> bool {
        self.creators.contains_key(&channel_id)
    }

    pub fn creator_for(&self, category_id: ChannelId) -> Option<ChannelId> {
        self.creators
            .iter()
            .find(|(_, category)| **category == category_id)
            .map(|(channel_id, _)| *channel_id)
    }

    pub fn creator_count(&self, category_id: ChannelId) -> usize {
        self.creators
            .values()
            .filter(|category| **category == category_id)
            .count()
    }

    /// Returns `true` only the first time a guild subscribes.
    pub fn subscribe(&mut self, guild_id: GuildId) -> bool {
        self.subscribed.insert(guild_id)
    }

    pub fn is_subscribed(&self, guild_id: GuildId) -> bool {
        self.subscribed.contains(&guild_id)
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
