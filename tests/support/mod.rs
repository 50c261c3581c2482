#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use narrative_rs::api::{Cell, EntityMetadata, NarrativeConfig, NarrativeSession, RawPageviewRow};
use narrative_rs::core::WindowSize;
use narrative_rs::render::{NullRenderer, PersonGroupPrimitive, RenderFrame, Renderer};
use serde_json::json;

pub const FOCUS: &str = "57317";
pub const COMPARISON: &str = "beyonce";
/// Past the longest chain of gated phases the fixture can schedule.
pub const SETTLE_MS: f64 = 60_000.0;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y%m%d").expect("fixture date")
}

fn stamp(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

/// Daily rows around a date of death with a spike on the death day.
pub fn person_rows(
    id: &str,
    death: &str,
    before: i64,
    after: i64,
    base: f64,
    spike: f64,
) -> Vec<RawPageviewRow> {
    let death = date(death);
    (-before..=after)
        .map(|offset| {
            let day = death + Duration::days(offset);
            let views = if offset == 0 {
                spike
            } else {
                base + offset.unsigned_abs() as f64
            };
            RawPageviewRow {
                pageid: Some(id.to_owned()),
                timestamp: Cell::Text(stamp(day)),
                views_adjusted: Cell::Number(views),
                bin_death_index: Some(Cell::Number(offset as f64)),
                death_views_adjusted_2: Some(Cell::Number(spike)),
                timestamp_of_death: Some(Cell::Text(stamp(death))),
            }
        })
        .collect()
}

/// Daily comparison rows from 2016-02-20, partly outside the date window.
pub fn comparison_rows() -> Vec<RawPageviewRow> {
    let start = date("20160220");
    (0..80)
        .map(|offset| RawPageviewRow {
            pageid: None,
            timestamp: Cell::Text(stamp(start + Duration::days(offset))),
            views_adjusted: Cell::Text(format!("{}", 1_000 + offset * 50)),
            bin_death_index: None,
            death_views_adjusted_2: None,
            timestamp_of_death: None,
        })
        .collect()
}

pub fn population_rows() -> Vec<RawPageviewRow> {
    let mut rows = person_rows(FOCUS, "20160421", 70, 4, 1_000.0, 500_000.0);
    rows.extend(person_rows("p2", "20160110", 60, 2, 500.0, 80_000.0));
    rows.extend(person_rows("p3", "20161225", 60, 2, 800.0, 250_000.0));
    rows
}

/// Person whose death-day row is missing from the table.
pub const UNMARKED: &str = "p4";

pub fn population_rows_with_unmarked() -> Vec<RawPageviewRow> {
    let mut rows = population_rows();
    rows.extend(
        person_rows(UNMARKED, "20160801", 60, 2, 600.0, 120_000.0)
            .into_iter()
            .filter(|row| {
                !matches!(row.bin_death_index, Some(Cell::Number(offset)) if offset == 0.0)
            }),
    );
    rows
}

pub fn metadata_with_unmarked() -> Vec<EntityMetadata> {
    let mut entries = metadata();
    entries.extend(
        serde_json::from_value::<Vec<EntityMetadata>>(json!([
            {"pageid": UNMARKED, "display": "Person Four", "perspective_show": false, "tags": ["film"]}
        ]))
        .expect("fixture metadata"),
    );
    entries
}

/// Load order deliberately differs from death order.
pub fn metadata() -> Vec<EntityMetadata> {
    serde_json::from_value(json!([
        {"pageid": "p3", "display": "Person Three", "perspective_show": true, "tags": ["music", "film"]},
        {"pageid": FOCUS, "display": "Prince", "perspective_show": false, "tags": ["music"]},
        {"pageid": "p2", "display": "Person Two", "perspective_show": false, "tags": ["sports"]}
    ]))
    .expect("fixture metadata")
}

pub fn window() -> WindowSize {
    WindowSize::new(1_000.0, 900.0)
}

pub fn session_with<R: Renderer>(renderer: R) -> NarrativeSession<R> {
    NarrativeSession::init(
        renderer,
        NarrativeConfig::default(),
        &metadata(),
        &population_rows(),
        &comparison_rows(),
        window(),
    )
    .expect("session init")
}

pub type Session = NarrativeSession<NullRenderer>;

pub fn session_with_unmarked() -> Session {
    NarrativeSession::init(
        NullRenderer::default(),
        NarrativeConfig::default(),
        &metadata_with_unmarked(),
        &population_rows_with_unmarked(),
        &comparison_rows(),
        window(),
    )
    .expect("session init")
}

pub fn session() -> Session {
    session_with(NullRenderer::default())
}

/// Enters `steps` in order, letting every transition finish in between.
pub fn walk(session: &mut Session, steps: &[(&str, bool)]) {
    for (name, reverse) in steps {
        session.enter_step(name, *reverse).expect("step");
        session.advance(SETTLE_MS);
    }
}

pub fn group<'a>(frame: &'a RenderFrame, entity_id: &str) -> &'a PersonGroupPrimitive {
    frame
        .person(entity_id)
        .unwrap_or_else(|| panic!("group `{entity_id}` should be rendered"))
}
