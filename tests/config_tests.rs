use narrative_rs::api::{Durations, NarrativeConfig, StepContext};
use narrative_rs::core::Margin;
use narrative_rs::NarrativeError;

#[test]
fn partial_json_falls_back_to_defaults() {
    let config = NarrativeConfig::from_json_str(r#"{"focus_id": "p2", "duration_ms": 1500}"#)
        .expect("config");
    assert_eq!(config.focus_id, "p2");
    assert_eq!(config.comparison_id, "beyonce");
    assert_eq!(config.comparison_events.len(), 3);
    assert_eq!(config.margin, Margin::default());

    let durations = Durations::for_context(&config, StepContext::forward());
    assert_eq!(durations.slow, 1_500.0);
    assert_eq!(durations.medium, 495.0);
    assert_eq!(durations.fast, 150.0);
}

#[test]
fn serialized_config_reads_back() {
    let config = NarrativeConfig::default()
        .with_focus_id("p3")
        .with_comparison_id("someone-else")
        .with_release_timestamp("20160501")
        .with_margin(Margin {
            top: 10.0,
            bottom: 30.0,
            left: 40.0,
            right: 40.0,
        })
        .with_radius_range(2.0, 10.0);
    let json = config.to_json_pretty().expect("json");
    let parsed = NarrativeConfig::from_json_str(&json).expect("parse");
    assert_eq!(parsed, config);
}

#[test]
fn invalid_settings_are_rejected() {
    for config in [
        NarrativeConfig::default().with_radius_range(10.0, 2.0),
        NarrativeConfig::default().with_duration_ms(0.0),
        NarrativeConfig::default().with_focus_id("beyonce"),
        NarrativeConfig::default().with_comparison_events(vec![]).with_focus_id(""),
    ] {
        assert!(matches!(
            config.validate(),
            Err(NarrativeError::InvalidConfig(_))
        ));
    }
}

#[test]
fn malformed_json_is_a_json_error() {
    let err = NarrativeConfig::from_json_str("{").expect_err("malformed");
    assert!(matches!(err, NarrativeError::Json(_)));
}
