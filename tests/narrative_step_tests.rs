mod support;

use approx::assert_relative_eq;
use narrative_rs::api::{Step, StepContext};
use narrative_rs::render::PersonGroupPrimitive;
use support::{
    COMPARISON, FOCUS, SETTLE_MS, UNMARKED, group, session, session_with_unmarked, walk,
};

fn assert_circles_match(left: &PersonGroupPrimitive, right: &PersonGroupPrimitive) {
    assert_eq!(left.circles.len(), right.circles.len());
    for (a, b) in left.circles.iter().zip(&right.circles) {
        assert_eq!(a.key, b.key);
        assert_relative_eq!(a.cx, b.cx, epsilon = 1e-9);
        assert_relative_eq!(a.cy, b.cy, epsilon = 1e-9);
        assert_relative_eq!(a.radius, b.radius, epsilon = 1e-9);
        assert_relative_eq!(a.opacity, b.opacity, epsilon = 1e-9);
    }
}

#[test]
fn nothing_is_drawn_before_the_first_step() {
    let session = session();
    let frame = session.frame();
    assert!(session.current_step().is_none());
    assert!(frame.people.is_empty());
    assert!(frame.annotations.is_empty());
}

#[test]
fn context_draws_the_comparison_entity_inside_its_date_window() {
    let mut session = session();
    walk(&mut session, &[("context", false)]);

    let frame = session.frame();
    assert_eq!(frame.people.len(), 1);
    let comparison = group(&frame, COMPARISON);
    assert!(comparison.is_highlight);
    assert!(comparison.path.is_some());
    // 2016-03-01 up to, but excluding, 2016-04-27.
    assert_eq!(comparison.circles.len(), 57);
    assert_eq!(comparison.circles[0].key, "20160301");
    assert!(comparison.circles.iter().all(|circle| circle.radius == 4.0));
    assert!(!frame.axis_texts.is_empty());
}

#[test]
fn lemonade_grows_only_the_release_marker() {
    let mut session = session();
    walk(&mut session, &[("context", false), ("lemonade", false)]);

    let frame = session.frame();
    let comparison = group(&frame, COMPARISON);
    for circle in &comparison.circles {
        let expected = if circle.key == "20160425" { 16.0 } else { 4.0 };
        assert_eq!(circle.radius, expected, "circle {}", circle.key);
    }
    assert_eq!(session.scene().annotation_count(), 1);
}

#[test]
fn group_identity_survives_step_changes() {
    let mut session = session();
    walk(&mut session, &[("context", false)]);
    let serial = session.scene().node_serial(COMPARISON).expect("comparison group");

    walk(
        &mut session,
        &[("lemonade", false), ("prince-before", false), ("prince-spike", false)],
    );
    assert_eq!(session.scene().node_serial(COMPARISON), Some(serial));

    let focus = session.scene().node_serial(FOCUS).expect("focus group");
    walk(&mut session, &[("prince-before", true)]);
    assert_eq!(session.scene().node_serial(FOCUS), Some(focus));
    assert_eq!(session.scene().node_serial(COMPARISON), Some(serial));
}

#[test]
fn prince_steps_play_forward_and_back() {
    let mut session = session();
    walk(&mut session, &[("context", false), ("prince-before", false)]);

    let frame = session.frame();
    let focus = group(&frame, FOCUS);
    assert!(focus.is_highlight);
    assert!(!group(&frame, COMPARISON).is_highlight);
    assert_eq!(focus.circles.len(), 50);
    assert!(focus.circles.iter().all(|circle| circle.radius == 4.0));
    assert!(!focus.circles.iter().any(|circle| circle.is_death_day));
    assert_eq!(
        frame.people.last().map(|group| group.entity_id.as_str()),
        Some(FOCUS)
    );

    walk(&mut session, &[("prince-spike", false)]);
    let frame = session.frame();
    let focus = group(&frame, FOCUS);
    assert_eq!(focus.circles.len(), 51);
    let death_day = focus
        .circles
        .iter()
        .find(|circle| circle.is_death_day)
        .expect("death day marker");
    assert_eq!(death_day.key, "20160421");
    assert_relative_eq!(death_day.radius, 16.0);
    assert_relative_eq!(death_day.stroke_width, 8.0);

    walk(&mut session, &[("prince-before", true)]);
    let frame = session.frame();
    let focus = group(&frame, FOCUS);
    assert_eq!(focus.circles.len(), 50);
    assert!(focus.circles.iter().all(|circle| circle.radius == 4.0));
    assert!(focus.circles.iter().all(|circle| circle.opacity == 1.0));
    assert_eq!(focus.path.as_ref().map(|path| path.opacity), Some(1.0));
}

#[test]
fn reverse_entry_restores_the_forward_rendering() {
    let mut forward = session();
    walk(&mut forward, &[("context", false), ("prince-before", false)]);

    let mut reversed = session();
    walk(
        &mut reversed,
        &[
            ("context", false),
            ("prince-before", false),
            ("prince-spike", false),
            ("prince-before", true),
        ],
    );

    let expected = forward.frame();
    let actual = reversed.frame();
    for id in [FOCUS, COMPARISON] {
        let (left, right) = (group(&expected, id), group(&actual, id));
        assert_circles_match(left, right);
        assert_eq!(
            left.path.as_ref().map(|path| path.d.as_str()),
            right.path.as_ref().map(|path| path.d.as_str()),
            "path of {id}"
        );
        assert_eq!(left.is_highlight, right.is_highlight);
    }
}

#[test]
fn leave_replays_are_idempotent_for_every_step() {
    for step in Step::ALL {
        let mut session = session();
        walk(&mut session, &[(step.name(), false)]);

        session
            .update_step(StepContext::leave())
            .expect("first replay");
        session.advance(SETTLE_MS);
        let first = session.frame();

        session
            .update_step(StepContext::leave())
            .expect("second replay");
        session.advance(SETTLE_MS);
        let second = session.frame();

        assert_eq!(first, second, "leave replay of `{step}` changed the scene");
    }
}

#[test]
fn unknown_steps_leave_the_scene_untouched() {
    let mut session = session();
    walk(&mut session, &[("context", false)]);
    let before = session.frame();

    session.enter_step("epilogue", false).expect("ignored");
    session.advance(SETTLE_MS);

    assert_eq!(session.current_step(), Some(Step::Context));
    assert_eq!(session.frame(), before);
}

#[test]
fn spike_phase_waits_for_the_path_transition() {
    let mut session = session();
    walk(&mut session, &[("context", false), ("prince-before", false)]);

    session.enter_step("prince-spike", false).expect("step");
    assert_eq!(session.scene().pending_gates(), 1);

    session.advance(2_999.0);
    assert_eq!(session.scene().pending_gates(), 1);
    assert_eq!(group(&session.frame(), FOCUS).circles.len(), 50);

    session.advance(2.0);
    assert_eq!(session.scene().pending_gates(), 0);
    assert_eq!(group(&session.frame(), FOCUS).circles.len(), 51);
}

#[test]
fn superseded_spike_phase_never_fires() {
    let mut session = session();
    walk(&mut session, &[("context", false), ("prince-before", false)]);

    session.enter_step("prince-spike", false).expect("step");
    session.advance(500.0);
    session.enter_step("prince-before", true).expect("step");
    assert_eq!(session.scene().pending_gates(), 0);

    session.advance(SETTLE_MS);
    let frame = session.frame();
    let focus = group(&frame, FOCUS);
    assert_eq!(focus.circles.len(), 50);
    assert!(!focus.circles.iter().any(|circle| circle.is_death_day));
}

#[test]
fn others_shows_every_person_by_magnitude() {
    let mut session = session();
    walk(
        &mut session,
        &[
            ("context", false),
            ("prince-before", false),
            ("prince-spike", false),
            ("others", false),
        ],
    );

    let frame = session.frame();
    assert!(frame.person(COMPARISON).is_none());
    assert_eq!(frame.people.len(), 3);
    assert!(frame.people.iter().all(|group| !group.is_highlight));

    for group in &frame.people {
        let death_day: Vec<_> = group
            .circles
            .iter()
            .filter(|circle| circle.is_death_day)
            .collect();
        assert_eq!(death_day.len(), 1, "{}", group.entity_id);
        assert!((4.0..=16.0).contains(&death_day[0].radius));
        assert_eq!(death_day[0].opacity, 1.0);

        let expected_label = if group.entity_id == "p3" { 1.0 } else { 0.0 };
        assert_eq!(group.label.opacity, expected_label, "{}", group.entity_id);
    }

    // Largest magnitude maps to the largest radius.
    let radius = |id: &str| {
        group(&frame, id)
            .circles
            .iter()
            .find(|circle| circle.is_death_day)
            .map(|circle| circle.radius)
            .unwrap_or_default()
    };
    assert_relative_eq!(radius(FOCUS), 16.0);
    assert!(radius("p2") < radius("p3"));
    assert_eq!(
        frame.people.last().map(|group| group.entity_id.as_str()),
        Some("p3")
    );
}

#[test]
fn compare_draws_annotations_and_hover_cells() {
    let mut session = session();
    walk(&mut session, &[("others", false), ("compare", false)]);

    assert_eq!(session.current_step(), Some(Step::Compare));
    assert_eq!(session.scene().annotation_count(), 3);
    assert!(session.scene().has_voronoi());

    let frame = session.frame();
    assert_eq!(frame.voronoi.len(), 3);
    assert!(frame.annotations.iter().all(|note| note.opacity == 1.0));

    // A layout pass replays compare in leave mode, which drops the notes.
    session.resize(support::window()).expect("resize");
    session.advance(SETTLE_MS);
    assert_eq!(session.scene().annotation_count(), 0);
    assert!(session.scene().has_voronoi());
}

#[test]
fn people_without_a_death_day_row_get_no_marker_or_hover_cell() {
    let mut session = session_with_unmarked();
    walk(
        &mut session,
        &[
            ("context", false),
            ("prince-before", false),
            ("prince-spike", false),
            ("others", false),
        ],
    );

    let frame = session.frame();
    assert_eq!(frame.people.len(), 4);
    let unmarked = group(&frame, UNMARKED);
    assert!(unmarked.circles.is_empty());
    assert!(unmarked.path.as_ref().is_none_or(|path| path.opacity == 0.0));
    session.frame().validate().expect("valid frame");

    walk(&mut session, &[("compare", false)]);
    let frame = session.frame();
    assert_eq!(frame.voronoi.len(), 3);
    assert!(frame.voronoi.iter().all(|cell| cell.entity_id != UNMARKED));
    assert!(
        !group(&frame, UNMARKED)
            .circles
            .iter()
            .any(|circle| circle.is_death_day)
    );

    for (name, reverse) in [("others", true), ("prince-spike", true)] {
        session.enter_step(name, reverse).expect("step");
        session.advance(SETTLE_MS);
        session
            .frame()
            .validate()
            .unwrap_or_else(|err| panic!("frame after `{name}` is invalid: {err}"));
    }
    assert!(session.frame().person(UNMARKED).is_none());
}

#[test]
fn navigate_clamps_at_both_ends() {
    let mut session = session();
    assert_eq!(session.navigate(-1).expect("navigate"), Step::Context);
    assert_eq!(session.navigate(10).expect("navigate"), Step::Compare);
    session.advance(SETTLE_MS);
    assert_eq!(session.navigate(-1).expect("navigate"), Step::Others);
}
