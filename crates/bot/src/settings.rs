use std::{collections::HashMap, path::Path};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use crews::CrewsConfig;
use serde::Deserialize;

const ENV_PREFIX: &str = "CREWS";
const DEFAULT_CONFIG_FILE: &str = "crews";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub api_token: String,
    pub log_filter: String,
    pub crews: CrewsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://discord.com/api/v10/".into(),
            api_token: String::new(),
            log_filter: "info".into(),
            crews: CrewsConfig::default(),
        }
    }
}

/// Defaults, then the TOML file (`crews.toml` in the working directory unless a
/// path is given), then `CREWS__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        .add_source(environment(None))
        .build()
        .context("failed to assemble configuration sources")?
        .try_deserialize::<Settings>()
        .context("invalid crews configuration")?;
    validate(&settings)?;
    Ok(settings)
}

pub(crate) fn parse_settings(
    raw_toml: &str,
    env: Option<HashMap<String, String>>,
) -> anyhow::Result<Settings> {
    let settings = Config::builder()
        .add_source(File::from_str(raw_toml, FileFormat::Toml))
        .add_source(environment(env))
        .build()?
        .try_deserialize::<Settings>()?;
    validate(&settings)?;
    Ok(settings)
}

fn environment(source: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("crews.crew_names")
        .with_list_parse_key("crews.alert_allowed_channels")
        .source(source)
}

fn validate(settings: &Settings) -> anyhow::Result<()> {
    if settings.api_base_url.trim().is_empty() {
        anyhow::bail!("api_base_url must not be empty");
    }
    for (category, overrides) in &settings.crews.categories {
        category
            .trim()
            .parse::<i64>()
            .with_context(|| format!("category key '{category}' is not a channel id"))?;
        if let Some(names) = &overrides.crew_names {
            if names.is_empty() {
                anyhow::bail!("category {category} overrides crew_names with an empty list");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
