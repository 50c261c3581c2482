mod support;

use approx::assert_relative_eq;
use narrative_rs::NarrativeError;
use narrative_rs::api::{Filter, ScrollRegion, Step, TooltipEvent};
use narrative_rs::core::WindowSize;
use support::{COMPARISON, FOCUS, SETTLE_MS, group, session, walk};

fn step_regions() -> Vec<ScrollRegion> {
    Step::ALL
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let top = 1_000.0 * (index as f64 + 1.0);
            ScrollRegion::new(step.name(), top, top + 1_000.0)
        })
        .collect()
}

#[test]
fn scrolling_through_step_blocks_drives_the_current_step() {
    let mut session = session();
    session.set_step_regions(step_regions());

    // The trigger line sits at 0.99 of the 900px window.
    session.on_scroll(0.0).expect("scroll");
    assert_eq!(session.current_step(), None);

    session.on_scroll(200.0).expect("scroll");
    assert_eq!(session.current_step(), Some(Step::Context));

    session.on_scroll(1_200.0).expect("scroll");
    assert_eq!(session.current_step(), Some(Step::Lemonade));
    session.advance(SETTLE_MS);
    assert_eq!(session.scene().annotation_count(), 1);

    session.on_scroll(300.0).expect("scroll");
    assert_eq!(session.current_step(), Some(Step::Context));
    session.advance(SETTLE_MS);
    assert_eq!(session.scene().annotation_count(), 0);
}

#[test]
fn hover_region_toggles_hover_and_hides_the_tooltip() {
    let mut session = session();
    session.set_hover_region(ScrollRegion::new("compare", 5_000.0, 6_000.0));
    assert!(!session.hover_enabled());

    assert_eq!(session.on_scroll(4_500.0).expect("scroll"), None);
    assert!(session.hover_enabled());

    let hidden = session.on_scroll(5_500.0).expect("scroll");
    assert_eq!(hidden, Some(TooltipEvent::Hide));
    assert!(!session.hover_enabled());
}

fn death_day_position(session: &support::Session, entity_id: &str) -> (f64, f64) {
    let frame = session.frame();
    group(&frame, entity_id)
        .circles
        .iter()
        .find(|circle| circle.is_death_day)
        .map(|circle| (circle.cx, circle.cy))
        .expect("death day marker")
}

#[test]
fn tooltip_anchor_follows_the_compare_layout() {
    let mut session = session();
    walk(&mut session, &[("others", false), ("compare", false)]);
    session.set_hover_enabled(true);

    let (cx, cy) = death_day_position(&session, "p3");
    let anchor = session.scene().death_day_anchor("p3").expect("anchor");
    assert_relative_eq!(anchor.0, cx, epsilon = 1e-9);
    assert_relative_eq!(anchor.1, cy, epsilon = 1e-9);

    session
        .resize(WindowSize::new(800.0, 900.0))
        .expect("resize");
    let margin = session.state().config.margin;
    let (x, y) = session.scene().death_day_anchor("p3").expect("anchor");
    let event = session
        .pointer_move(x + margin.left, y + margin.top)
        .expect("tooltip");
    assert_eq!(
        event,
        TooltipEvent::Show {
            entity_id: "p3".to_owned(),
            display_name: "Person Three".to_owned(),
            x: x + margin.left,
            y: y + margin.top,
        }
    );

    session.advance(SETTLE_MS);
    let (cx, cy) = death_day_position(&session, "p3");
    assert_relative_eq!(x, cx, epsilon = 1e-9);
    assert_relative_eq!(y, cy, epsilon = 1e-9);
}

#[test]
fn pointer_over_a_cell_shows_its_person() {
    let mut session = session();
    walk(&mut session, &[("others", false), ("compare", false)]);
    session.set_hover_enabled(true);

    let margin = session.state().config.margin;
    let (x, y) = session
        .scene()
        .death_day_anchor("p3")
        .expect("death day anchor");
    let event = session
        .pointer_move(x + margin.left, y + margin.top)
        .expect("tooltip");
    assert!(event.is_show());

    assert_eq!(
        event,
        TooltipEvent::Show {
            entity_id: "p3".to_owned(),
            display_name: "Person Three".to_owned(),
            x: x + margin.left,
            y: y + margin.top,
        }
    );
    let frame = session.frame();
    assert!(group(&frame, "p3").is_active);
    assert!(!group(&frame, FOCUS).is_active);
    assert_eq!(
        frame.people.last().map(|group| group.entity_id.as_str()),
        Some("p3")
    );
    assert_eq!(session.pointer_leave(), TooltipEvent::Hide);
}

#[test]
fn pointer_is_ignored_outside_compare_or_without_hover() {
    let mut session = session();
    walk(&mut session, &[("others", false)]);
    session.set_hover_enabled(true);
    assert_eq!(session.pointer_move(300.0, 300.0), None);

    walk(&mut session, &[("compare", false)]);
    session.set_hover_enabled(false);
    assert_eq!(session.pointer_move(300.0, 300.0), None);
}

#[test]
fn filter_fades_people_without_the_attribute_value() {
    let mut session = session();
    walk(&mut session, &[("others", false)]);

    session.filter(&Filter::new("tags", "music"));
    let frame = session.frame();
    assert!(!group(&frame, FOCUS).is_faded);
    assert!(!group(&frame, "p3").is_faded);
    assert!(group(&frame, "p2").is_faded);

    session.filter(&Filter::new("display", "Two"));
    let frame = session.frame();
    assert!(group(&frame, FOCUS).is_faded);
    assert!(!group(&frame, "p2").is_faded);

    session.filter(&Filter::default());
    assert!(session.frame().people.iter().all(|group| !group.is_faded));
}

#[test]
fn comparison_entity_fades_under_any_filter() {
    let mut session = session();
    walk(&mut session, &[("context", false)]);
    session.filter(&Filter::new("tags", "music"));
    assert!(group(&session.frame(), COMPARISON).is_faded);
}

#[test]
fn resize_relayouts_the_current_step() {
    let mut session = session();
    assert_eq!(session.viewport().width, 900.0);
    assert_eq!(session.viewport().height, 660.0);

    walk(&mut session, &[("context", false)]);
    let path = |session: &support::Session| {
        group(&session.frame(), COMPARISON)
            .path
            .as_ref()
            .map(|path| path.d.clone())
    };
    let before = path(&session);

    session
        .resize(WindowSize::new(600.0, 900.0))
        .expect("resize");
    session.advance(SETTLE_MS);
    assert_eq!(session.viewport().width, 500.0);
    assert_eq!(session.frame().viewport.width, 500.0);
    assert_ne!(path(&session), before);

    let err = session
        .resize(WindowSize::new(80.0, 900.0))
        .expect_err("no room left for the plot");
    assert!(matches!(err, NarrativeError::InvalidViewport { .. }));
    assert_eq!(session.viewport().width, 500.0);
}

#[test]
fn render_hands_valid_frames_to_the_backend() {
    let mut session = session();
    walk(&mut session, &[("context", false), ("prince-before", false)]);
    session.render().expect("render");

    let renderer = session.into_renderer();
    assert_eq!(renderer.frames_rendered, 1);
    assert_eq!(renderer.last_group_count, 2);
    assert_eq!(renderer.last_circle_count, 57 + 50);
}
