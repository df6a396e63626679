use super::*;

fn sample() -> CrewsConfig {
    serde_json::from_value(serde_json::json!({
        "crew_names": ["Alpha", "Beta"],
        "crew_formatter": "Crew {}",
        "log_channel": 40,
        "alert_allowed_channels": [30],
        "categories": {
            "10": {},
            "11": {
                "crew_names": ["Gamma"],
                "crew_formatter": "[{}]",
                "crew_size": 5,
                "alert_allowed_channels": [31, 32]
            },
            "12": { "enabled": false },
            "general": {}
        }
    }))
    .expect("config")
}

#[test]
fn category_without_overrides_uses_global_values() {
    let settings = sample().settings_for(ChannelId(10));
    assert!(settings.enabled);
    assert_eq!(settings.crew_names, vec!["Alpha", "Beta"]);
    assert_eq!(settings.log_channel, Some(ChannelId(40)));
    assert_eq!(settings.alert_allowed_channels, vec![ChannelId(30)]);
    assert_eq!(settings.user_limit(), None);
}

#[test]
fn category_overrides_take_precedence() {
    let settings = sample().settings_for(ChannelId(11));
    assert_eq!(settings.crew_names, vec!["Gamma"]);
    assert_eq!(settings.format_crew_name("Gamma"), "[Gamma]");
    assert_eq!(settings.user_limit(), Some(5));
    assert_eq!(
        settings.alert_allowed_channels,
        vec![ChannelId(31), ChannelId(32)]
    );
    assert_eq!(settings.log_channel, Some(ChannelId(40)));
}

#[test]
fn configured_categories_skip_disabled_and_malformed_ids() {
    assert_eq!(
        sample().configured_categories(),
        vec![ChannelId(10), ChannelId(11)]
    );
}

#[test]
fn globally_disabled_config_manages_nothing() {
    let mut config = sample();
    config.enabled = false;
    assert!(config.configured_categories().is_empty());
}

#[test]
fn renders_standard_and_custom_alerts() {
    let settings = CrewsConfig::default().settings_for(ChannelId(1));
    let link = settings.invite_link("abc123");
    assert_eq!(link, "https://discord.gg/abc123");

    assert_eq!(
        settings.render_alert("<@7>", &link, None),
        "<@7> is looking for crewmates: https://discord.gg/abc123"
    );
    assert_eq!(
        settings.render_alert("<@7>", &link, Some("ranked, mic required")),
        "<@7> is looking for crewmates: ranked, mic required\nhttps://discord.gg/abc123"
    );
}

#[test]
fn formatter_without_placeholder_is_used_verbatim() {
    let mut config = CrewsConfig::default();
    config.crew_formatter = "Squad".into();
    assert_eq!(
        config.settings_for(ChannelId(1)).format_crew_name("Alpha"),
        "Squad"
    );
}
