mod support;

use chrono::{TimeZone, Utc};
use narrative_rs::NarrativeError;
use narrative_rs::api::{Cell, EntityMetadata, NarrativeConfig, build_store, loader};
use narrative_rs::core::TrimWindow;
use serde_json::json;
use support::{COMPARISON, FOCUS, comparison_rows, metadata, person_rows, population_rows};

#[test]
fn comparison_rows_are_limited_to_the_date_window() {
    let config = NarrativeConfig::default();
    let store = build_store(&config, &metadata(), &population_rows(), &comparison_rows())
        .expect("store");

    let comparison = store.comparison();
    assert_eq!(comparison.id, COMPARISON);
    assert_eq!(comparison.load_index, 3);
    let first = comparison.pageviews.first().expect("first point");
    let last = comparison.pageviews.last().expect("last point");
    assert_eq!(first.timestamp, "20160301");
    assert_eq!(last.timestamp, "20160426");
    assert!(
        comparison
            .pageviews
            .iter()
            .all(|point| point.entity_id == COMPARISON && point.bin_death_index.is_none())
    );
}

#[test]
fn people_keep_metadata_order_and_attributes() {
    let store = build_store(
        &NarrativeConfig::default(),
        &metadata(),
        &population_rows(),
        &comparison_rows(),
    )
    .expect("store");

    let ids: Vec<&str> = store.people().iter().map(|person| person.id.as_str()).collect();
    assert_eq!(ids, vec!["p3", FOCUS, "p2"]);

    let focus = store.person(FOCUS).expect("focus");
    assert_eq!(focus.display_name, "Prince");
    assert_eq!(focus.load_index, 1);
    assert_eq!(focus.attributes.get("tags"), Some(&json!(["music"])));
    assert!(!focus.attributes.contains_key("display"));
    assert_eq!(
        focus.death_day_point().map(|point| point.timestamp.as_str()),
        Some("20160421")
    );

    let by_death: Vec<String> = store
        .population_by_death(TrimWindow::new(0, 0))
        .into_iter()
        .map(|view| view.id)
        .collect();
    assert_eq!(by_death, vec!["p2", FOCUS, "p3"]);
}

#[test]
fn trimmed_views_copy_only_the_window() {
    let store = build_store(
        &NarrativeConfig::default(),
        &metadata(),
        &population_rows(),
        &comparison_rows(),
    )
    .expect("store");
    let focus = store.person(FOCUS).expect("focus");

    let view = focus.trimmed_view(TrimWindow::new(-3, 0));
    let indices: Vec<Option<i32>> = view.pageviews.iter().map(|p| p.bin_death_index).collect();
    assert_eq!(indices, vec![Some(-3), Some(-2), Some(-1), Some(0)]);
    assert_eq!(view.magnitude, Some(500_000.0));
    assert_eq!(focus.pageviews.len(), 75);
}

#[test]
fn metadata_death_date_wins_over_row_columns() {
    let mut metadata = metadata();
    metadata[1].timestamp_of_death = Some("2016-04-21T15:00:00Z".to_owned());
    let store = build_store(
        &NarrativeConfig::default(),
        &metadata,
        &population_rows(),
        &comparison_rows(),
    )
    .expect("store");

    let death = store
        .person(FOCUS)
        .and_then(|person| person.timestamp_of_death())
        .expect("date of death");
    assert_eq!(death.to_rfc3339(), "2016-04-21T15:00:00+00:00");
}

#[test]
fn person_without_any_death_date_is_rejected() {
    let metadata: Vec<EntityMetadata> = serde_json::from_value(json!([
        {"pageid": "ghost", "display": "Nobody"}
    ]))
    .expect("metadata");
    let mut rows = person_rows("ghost", "20160301", 3, 0, 10.0, 20.0);
    for row in &mut rows {
        row.bin_death_index = None;
        row.timestamp_of_death = None;
    }

    let err = build_store(
        &NarrativeConfig::default().with_focus_id("ghost"),
        &metadata,
        &rows,
        &comparison_rows(),
    )
    .expect_err("no date of death");
    assert!(matches!(err, NarrativeError::InvalidData(_)));
}

#[test]
fn empty_comparison_window_is_rejected() {
    let config = NarrativeConfig::default().with_date_window(
        Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2010, 2, 1, 0, 0, 0).unwrap(),
    );
    let err = build_store(&config, &metadata(), &population_rows(), &comparison_rows())
        .expect_err("no comparison points in window");
    assert!(matches!(err, NarrativeError::InvalidData(_)));
}

#[test]
fn malformed_rows_surface_their_position() {
    let mut rows = population_rows();
    rows[4].views_adjusted = Cell::Text("lots".to_owned());
    let err = build_store(&NarrativeConfig::default(), &metadata(), &rows, &comparison_rows())
        .expect_err("row 4 is malformed");
    assert!(matches!(err, NarrativeError::DataLoad { row: 4, .. }));
}

#[test]
fn json_tables_load_into_a_store() {
    let metadata = loader::metadata_from_json_str(
        r#"[{"pageid": "57317", "display": "Prince", "timestamp_of_death": "20160421", "genre": "funk"}]"#,
    )
    .expect("metadata");
    let population = loader::rows_from_json_str(
        r#"[
            {"pageid": "57317", "timestamp": "20160420", "views_adjusted": "1200", "bin_death_index": "-1", "death_views_adjusted_2": "90000"},
            {"pageid": "57317", "timestamp": "20160421", "views_adjusted": "90000", "bin_death_index": "0", "death_views_adjusted_2": "90000"}
        ]"#,
    )
    .expect("rows");
    let comparison = loader::rows_from_json_str(
        r#"[{"timestamp": "20160310", "views_adjusted": 5000}]"#,
    )
    .expect("rows");

    let store = build_store(&NarrativeConfig::default(), &metadata, &population, &comparison)
        .expect("store");
    let focus = store.person(FOCUS).expect("focus");
    assert_eq!(focus.pageviews.len(), 2);
    assert_eq!(focus.attributes.get("genre"), Some(&json!("funk")));
    assert_eq!(store.comparison().pageviews.len(), 1);
}
