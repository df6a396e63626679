use super::{parse_settings, Settings};

use std::collections::HashMap;

use shared::domain::ChannelId;

const SAMPLE: &str = r#"
api_token = "secret"

[crews]
crew_names = ["Alpha", "Beta", "Gamma"]
crew_formatter = "Crew {}"
alert_allowed_channels = [30]

[crews.categories."10"]
log_channel = 40

[crews.categories."11"]
crew_names = ["Delta"]
enabled = false
"#;

#[test]
fn defaults_apply_to_empty_file() {
    let settings = parse_settings("", Some(HashMap::new())).expect("settings");
    let defaults = Settings::default();
    assert_eq!(settings.api_base_url, defaults.api_base_url);
    assert_eq!(settings.log_filter, "info");
    assert_eq!(settings.crews.command_prefix, "!i");
    assert!(settings.crews.categories.is_empty());
}

#[test]
fn reads_global_values_and_category_overrides() {
    let settings = parse_settings(SAMPLE, Some(HashMap::new())).expect("settings");
    assert_eq!(settings.api_token, "secret");
    assert_eq!(settings.crews.configured_categories(), vec![ChannelId(10)]);

    let category = settings.crews.settings_for(ChannelId(10));
    assert_eq!(category.crew_names, vec!["Alpha", "Beta", "Gamma"]);
    assert_eq!(category.log_channel, Some(ChannelId(40)));
    assert_eq!(category.alert_allowed_channels, vec![ChannelId(30)]);
}

#[test]
fn environment_overrides_file_values() {
    let env = HashMap::from([
        ("CREWS__API_TOKEN".to_string(), "from-env".to_string()),
        ("CREWS__LOG_FILTER".to_string(), "debug".to_string()),
        ("CREWS__CREWS__CREW_NAMES".to_string(), "Red,Blue".to_string()),
    ]);
    let settings = parse_settings(SAMPLE, Some(env)).expect("settings");
    assert_eq!(settings.api_token, "from-env");
    assert_eq!(settings.log_filter, "debug");
    assert_eq!(settings.crews.crew_names, vec!["Red", "Blue"]);
}

#[test]
fn rejects_non_numeric_category_keys() {
    let raw = r#"
[crews.categories.lobby]
crew_formatter = "{}"
"#;
    let err = parse_settings(raw, Some(HashMap::new())).expect_err("should fail");
    assert!(err.to_string().contains("lobby"));
}

#[test]
fn rejects_empty_crew_name_override() {
    let raw = r#"
[crews.categories."10"]
crew_names = []
"#;
    assert!(parse_settings(raw, Some(HashMap::new())).is_err());
}
