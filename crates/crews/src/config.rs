use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shared::domain::ChannelId;
use tracing::warn;

/// Global crew settings plus per-category overrides keyed by category id.
///
/// Only categories listed under `categories` are managed; every field of an
/// override falls back to the global value when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewsConfig {
    pub enabled: bool,
    pub command_prefix: String,
    pub crew_names: Vec<String>,
    /// `{}` is replaced with the chosen crew name.
    pub crew_formatter: String,
    pub new_crew_name: String,
    /// Occupancy limit of creator channels; 0 leaves the platform default.
    pub crew_size: u32,
    pub log_channel: Option<ChannelId>,
    pub alert_allowed_channels: Vec<ChannelId>,
    pub alert_invite_max_age: u64,
    pub alert_message_standard: String,
    pub alert_message_custom: String,
    pub invite_base_url: String,
    pub categories: HashMap<String, CategoryOverrides>,
}

impl Default for CrewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command_prefix: "!i".into(),
            crew_names: Vec::new(),
            crew_formatter: "Crew {}".into(),
            new_crew_name: "+ New crew".into(),
            crew_size: 0,
            log_channel: None,
            alert_allowed_channels: Vec::new(),
            alert_invite_max_age: 3600,
            alert_message_standard: "{creator_tag} is looking for crewmates: {link}".into(),
            alert_message_custom: "{creator_tag} is looking for crewmates: {msg}\n{link}".into(),
            invite_base_url: "https://discord.gg/".into(),
            categories: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryOverrides {
    pub enabled: Option<bool>,
    pub crew_names: Option<Vec<String>>,
    pub crew_formatter: Option<String>,
    pub new_crew_name: Option<String>,
    pub crew_size: Option<u32>,
    pub log_channel: Option<ChannelId>,
    pub alert_allowed_channels: Option<Vec<ChannelId>>,
    pub alert_invite_max_age: Option<u64>,
    pub alert_message_standard: Option<String>,
    pub alert_message_custom: Option<String>,
}

/// Fully resolved settings for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySettings {
    pub enabled: bool,
    pub crew_names: Vec<String>,
    pub crew_formatter: String,
    pub new_crew_name: String,
    pub crew_size: u32,
    pub log_channel: Option<ChannelId>,
    pub alert_allowed_channels: Vec<ChannelId>,
    pub alert_invite_max_age: u64,
    pub alert_message_standard: String,
    pub alert_message_custom: String,
    pub invite_base_url: String,
}

impl CrewsConfig {
    /// Category ids that are configured and enabled.
    pub fn configured_categories(&self) -> Vec<ChannelId> {
        let mut categories: Vec<ChannelId> = self
            .categories
            .keys()
            .filter_map(|raw| match raw.trim().parse::<i64>() {
                Ok(id) => Some(ChannelId(id)),
                Err(_) => {
                    warn!(category = %raw, "crews: ignoring category with non-numeric id");
                    None
                }
            })
            .filter(|id| self.settings_for(*id).enabled)
            .collect();
        categories.sort();
        categories
    }

    pub fn settings_for(&self, category_id: ChannelId) -> CategorySettings {
        let overrides = self
            .categories
            .get(&category_id.0.to_string())
            .cloned()
            .unwrap_or_default();

        CategorySettings {
            enabled: self.enabled && overrides.enabled.unwrap_or(true),
            crew_names: overrides
                .crew_names
                .unwrap_or_else(|| self.crew_names.clone()),
            crew_formatter: overrides
                .crew_formatter
                .unwrap_or_else(|| self.crew_formatter.clone()),
            new_crew_name: overrides
                .new_crew_name
                .unwrap_or_else(|| self.new_crew_name.clone()),
            crew_size: overrides.crew_size.unwrap_or(self.crew_size),
            log_channel: overrides.log_channel.or(self.log_channel),
            alert_allowed_channels: overrides
                .alert_allowed_channels
                .unwrap_or_else(|| self.alert_allowed_channels.clone()),
            alert_invite_max_age: overrides
                .alert_invite_max_age
                .unwrap_or(self.alert_invite_max_age),
            alert_message_standard: overrides
                .alert_message_standard
                .unwrap_or_else(|| self.alert_message_standard.clone()),
            alert_message_custom: overrides
                .alert_message_custom
                .unwrap_or_else(|| self.alert_message_custom.clone()),
            invite_base_url: self.invite_base_url.clone(),
        }
    }
}

impl CategorySettings {
    pub fn user_limit(&self) -> Option<u32> {
        (self.crew_size > 0).then_some(self.crew_size)
    }

    /// Substitutes the first `{}`; a formatter without one is used as is.
    pub fn format_crew_name(&self, chosen: &str) -> String {
        self.crew_formatter.replacen("{}", chosen, 1)
    }

    pub fn invite_link(&self, code: &str) -> String {
        format!("{}{code}", self.invite_base_url)
    }

    /// Renders the custom template when the requester supplied a message, the
    /// standard one otherwise.
    pub fn render_alert(&self, creator_tag: &str, link: &str, message: Option<&str>) -> String {
        match message {
            Some(text) => self
                .alert_message_custom
                .replace("{creator_tag}", creator_tag)
                .replace("{link}", link)
                .replace("{msg}", text),
            None => self
                .alert_message_standard
                .replace("{creator_tag}", creator_tag)
                .replace("{link}", link),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
