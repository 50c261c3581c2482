use chrono::{Duration, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use kurbo::{Point, Rect};
use narrative_rs::api::{Cell, EntityMetadata, NarrativeConfig, NarrativeSession, RawPageviewRow};
use narrative_rs::core::{
    LinearScale, PageviewPoint, ScaleSet, TimeScale, Viewport, VoronoiDiagram, WindowSize,
    build_line_path, path_length,
};
use narrative_rs::render::NullRenderer;
use std::hint::black_box;

fn bench_linear_scale_round_trip(c: &mut Criterion) {
    let scale = LinearScale::new((0.0, 10_000.0), (1_080.0, 0.0)).expect("valid scale");

    c.bench_function("linear_scale_round_trip", |b| {
        b.iter(|| {
            let px = scale.apply(black_box(4_321.123));
            let _ = scale.invert(px);
        })
    });
}

fn daily_points(count: usize) -> Vec<PageviewPoint> {
    let origin = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let date = origin + Duration::days(i as i64);
            PageviewPoint {
                entity_id: "bench".to_owned(),
                date,
                timestamp: date.format("%Y%m%d").to_string(),
                views_adjusted: 1_000.0 + (i as f64 * 0.37).sin() * 500.0,
                bin_death_index: None,
                death_views_adjusted_2: 0.0,
            }
        })
        .collect()
}

fn bench_line_path_2k(c: &mut Criterion) {
    let points = daily_points(2_000);
    let (first, last) = (points[0].date, points[points.len() - 1].date);
    let scales = ScaleSet {
        x: TimeScale::new(first, last, (0.0, 1_600.0)).expect("valid time scale"),
        y: LinearScale::new((0.0, 2_000.0), (900.0, 0.0)).expect("valid scale"),
        r: None,
    };

    c.bench_function("line_path_2k", |b| {
        b.iter(|| {
            let path = build_line_path(black_box(&points), black_box(&scales));
            let _ = path_length(&path);
        })
    });
}

fn bench_voronoi_300(c: &mut Criterion) {
    let sites: Vec<Option<Point>> = (0..300)
        .map(|i| {
            let t = i as f64;
            Some(Point::new((t * 37.0) % 1_600.0, (t * 53.0) % 900.0))
        })
        .collect();
    let extent = Rect::new(-50.0, -20.0, 1_650.0, 920.0);

    c.bench_function("voronoi_300", |b| {
        b.iter(|| {
            let diagram = VoronoiDiagram::new(black_box(sites.clone()), extent);
            let _ = diagram.find(Point::new(800.0, 450.0));
        })
    });
}

fn population(people: usize) -> (Vec<EntityMetadata>, Vec<RawPageviewRow>) {
    let origin = Utc.with_ymd_and_hms(2016, 4, 21, 0, 0, 0).unwrap();
    let mut metadata = Vec::with_capacity(people);
    let mut rows = Vec::new();
    for person in 0..people {
        let id = if person == 0 {
            "57317".to_owned()
        } else {
            format!("p{person}")
        };
        let death = origin + Duration::days(person as i64 * 3);
        metadata.push(
            serde_json::from_value(serde_json::json!({
                "pageid": id,
                "display": format!("Person {person}"),
                "perspective_show": person % 10 == 0,
            }))
            .expect("metadata"),
        );
        for offset in -60i64..=2 {
            let day = death + Duration::days(offset);
            rows.push(RawPageviewRow {
                pageid: Some(id.clone()),
                timestamp: Cell::Text(day.format("%Y%m%d").to_string()),
                views_adjusted: Cell::Number(if offset == 0 { 50_000.0 } else { 900.0 }),
                bin_death_index: Some(Cell::Number(offset as f64)),
                death_views_adjusted_2: Some(Cell::Number(50_000.0 + person as f64)),
                timestamp_of_death: Some(Cell::Text(death.format("%Y%m%d").to_string())),
            });
        }
    }
    (metadata, rows)
}

fn comparison() -> Vec<RawPageviewRow> {
    let origin = Utc.with_ymd_and_hms(2016, 3, 1, 0, 0, 0).unwrap();
    (0..57)
        .map(|i| {
            let day = origin + Duration::days(i);
            RawPageviewRow {
                pageid: None,
                timestamp: Cell::Text(day.format("%Y%m%d").to_string()),
                views_adjusted: Cell::Number(1_000.0 + i as f64 * 20.0),
                bin_death_index: None,
                death_views_adjusted_2: None,
                timestamp_of_death: None,
            }
        })
        .collect()
}

fn bench_step_cycle_200_people(c: &mut Criterion) {
    let (metadata, rows) = population(200);
    let comparison = comparison();
    let mut session = NarrativeSession::init(
        NullRenderer::default(),
        NarrativeConfig::default(),
        &metadata,
        &rows,
        &comparison,
        WindowSize::new(1_600.0, 1_000.0),
    )
    .expect("session init");

    c.bench_function("step_cycle_200_people", |b| {
        b.iter(|| {
            for name in ["prince-spike", "others", "compare"] {
                session.enter_step(name, false).expect("step");
                session.advance(60_000.0);
            }
            session.render().expect("render");
            black_box(session.viewport() == Viewport::new(1_500.0, 740.0));
        })
    });
}

criterion_group!(
    benches,
    bench_linear_scale_round_trip,
    bench_line_path_2k,
    bench_voronoi_300,
    bench_step_cycle_200_people
);
criterion_main!(benches);
