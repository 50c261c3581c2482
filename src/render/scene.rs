use indexmap::IndexMap;
use kurbo::Point;
use tracing::{debug, trace};

use crate::animation::{Channel, Ease, Timing};
use crate::core::{EntityView, Margin, ScaleSet, Viewport, VoronoiDiagram};
use crate::render::annotation_layer::{AnnotationLayer, AnnotationStyle};
use crate::render::axis_layer::{AxisLayer, AxisStyle};
use crate::render::entity_renderer::PersonNode;
use crate::render::ops::{
    CircleAnimation, EntityFilter, Gate, HighlightRule, PathRedraw, PathUpdate, ScenePlan,
    SceneOp, Selection, WatchTarget,
};
use crate::render::reconcile::reconcile;
use crate::render::{PolygonPrimitive, RenderFrame};

/// Plot geometry and typography the scene lays out against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLayout {
    pub viewport: Viewport,
    pub margin: Margin,
    pub font_size: f64,
    /// Padding between an annotation subject and its connector.
    pub annotation_padding: f64,
    pub annotation_wrap: f64,
}

impl SceneLayout {
    fn axis_style(self) -> AxisStyle {
        AxisStyle {
            viewport: self.viewport,
            margin: self.margin,
            font_size: self.font_size,
        }
    }

    fn annotation_style(self) -> AnnotationStyle {
        AnnotationStyle {
            font_size: self.font_size,
            radius_padding: self.annotation_padding,
            wrap_width: self.annotation_wrap,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingGate {
    gate: Gate,
    /// Serial of the watched transition at registration time.
    serial: u64,
    scales: ScaleSet,
    ease: Ease,
}

#[derive(Debug, Clone)]
struct VoronoiOverlay {
    entity_ids: Vec<String>,
    diagram: VoronoiDiagram,
}

/// Retained scene graph with a deterministic animation clock.
///
/// Groups persist across plans and are only ever mutated attribute by
/// attribute; the clock only moves when the host advances it.
#[derive(Debug, Clone)]
pub struct Scene {
    layout: SceneLayout,
    now_ms: f64,
    next_serial: u64,
    people: IndexMap<String, PersonNode>,
    entered: Vec<String>,
    updated: Vec<String>,
    axis: AxisLayer,
    annotations: AnnotationLayer,
    voronoi: Option<VoronoiOverlay>,
    gates: Vec<PendingGate>,
}

impl Scene {
    #[must_use]
    pub fn new(layout: SceneLayout) -> Self {
        Self {
            layout,
            now_ms: 0.0,
            next_serial: 0,
            people: IndexMap::new(),
            entered: Vec::new(),
            updated: Vec::new(),
            axis: AxisLayer::new(layout.axis_style()),
            annotations: AnnotationLayer::new(layout.annotation_style()),
            voronoi: None,
            gates: Vec::new(),
        }
    }

    #[must_use]
    pub fn layout(&self) -> SceneLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: SceneLayout) {
        self.layout = layout;
        self.axis.set_style(layout.axis_style());
        self.annotations.set_style(layout.annotation_style());
    }

    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn bump_serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    /// Applies every op of `plan` at the current instant.
    pub fn apply(&mut self, plan: &ScenePlan) {
        trace!(ops = plan.ops.len(), now_ms = self.now_ms, "apply scene plan");
        self.apply_ops(&plan.ops, &plan.scales, plan.ease);
    }

    fn apply_ops(&mut self, ops: &[SceneOp], scales: &ScaleSet, ease: Ease) {
        for op in ops {
            self.apply_op(op, scales, ease);
        }
    }

    fn apply_op(&mut self, op: &SceneOp, scales: &ScaleSet, ease: Ease) {
        let now = self.now_ms;
        match op {
            SceneOp::Axis {
                duration_ms,
                y_ticks,
                x_ticks,
            } => {
                let serial = self.bump_serial();
                self.axis.update(
                    now,
                    scales,
                    (y_ticks.as_slice(), x_ticks.as_slice()),
                    Timing::new(*duration_ms),
                    ease,
                    serial,
                );
            }
            SceneOp::Join {
                entities,
                exit_duration_ms,
            } => self.join(entities, *exit_duration_ms, ease),
            SceneOp::BindPaths {
                selection,
                entities,
                redraw,
            } => {
                for id in self.selected(*selection, entities) {
                    if let Some(node) = self.people.get_mut(&id) {
                        node.bind_path(scales, *redraw);
                    }
                }
            }
            SceneOp::BindCircles {
                selection,
                entities,
                named,
                enter_radius,
            } => {
                let ids = self.selected(*selection, entities);
                let counter = &mut self.next_serial;
                let mut next_serial = || {
                    *counter += 1;
                    *counter
                };
                for id in ids {
                    if let Some(node) = self.people.get_mut(&id) {
                        node.bind_circles(scales, named, *enter_radius, &mut next_serial);
                    }
                }
            }
            SceneOp::ResetDash { entities } => {
                for id in self.selected(Selection::Merged, entities) {
                    if let Some(node) = self.people.get_mut(&id) {
                        let length = node.path.length(now);
                        node.path.dash = Some(length);
                        node.path.dash_offset.snap(length);
                    }
                }
            }
            SceneOp::ExtendReveal { entities, reveal } => {
                for id in self.selected(Selection::Merged, entities) {
                    if let Some(node) = self.people.get_mut(&id) {
                        let previous = node.path.length(now);
                        node.bind_path(scales, true);
                        let length = node.path.length(now);
                        node.path.dash = Some(length);
                        if *reveal {
                            node.path.dash_offset.snap(length - previous);
                        }
                    }
                }
            }
            SceneOp::AnimatePaths(update) => self.animate_paths(update, scales, ease),
            SceneOp::SetPaths { update, clear_dash } => {
                for id in self.selected(update.selection, &update.entities) {
                    if let Some(node) = self.people.get_mut(&id) {
                        if update.redraw != PathRedraw::Keep {
                            let line = node.path.line(scales);
                            node.path.d.snap(line);
                        }
                        if let Some(offset) = update.dash_offset {
                            node.path.dash_offset.snap(offset);
                        }
                        if let Some(opacity) = update.opacity {
                            node.path.opacity.snap(opacity);
                        }
                        if *clear_dash {
                            node.path.dash = None;
                        }
                    }
                }
            }
            SceneOp::SnapCircleRadius { entities, radius } => {
                for id in self.selected(Selection::Merged, entities) {
                    if let Some(node) = self.people.get_mut(&id) {
                        for circle in node.circles.values_mut() {
                            circle.radius.snap(*radius);
                        }
                    }
                }
            }
            SceneOp::AnimateCircles(animation) => self.animate_circles(animation, scales, ease),
            SceneOp::SetCircleActive(active) => {
                for id in self.selected(Selection::Merged, &EntityFilter::All) {
                    if let Some(node) = self.people.get_mut(&id) {
                        for circle in node.circles.values_mut() {
                            circle.is_active = *active;
                        }
                    }
                }
            }
            SceneOp::MarkTransparent => {
                for id in self.selected(Selection::Merged, &EntityFilter::All) {
                    if let Some(node) = self.people.get_mut(&id) {
                        for circle in node.circles.values_mut() {
                            if circle.not_death_index {
                                circle.is_transparent = true;
                            }
                        }
                    }
                }
            }
            SceneOp::PlaceLabels { selection } => {
                for id in self.selected(*selection, &EntityFilter::All) {
                    if let Some(node) = self.people.get_mut(&id) {
                        let Some(first) = node.datum.pageviews.first() else {
                            continue;
                        };
                        let (x, y) = scales.project(first);
                        let lift = scales.radius(first.views_adjusted * 1.5).unwrap_or(0.0);
                        node.label.x = x;
                        node.label.y = y - lift;
                    }
                }
            }
            SceneOp::AnimateLabels {
                selection,
                timing,
                delay,
                opacity,
            } => {
                let serial = self.bump_serial();
                for id in self.selected(*selection, &EntityFilter::All) {
                    if let Some(node) = self.people.get_mut(&id) {
                        let start = delay.resolve(&node.datum, 0, 1, ease) + timing.delay_ms;
                        let target = opacity.resolve(&node.datum, None, scales);
                        node.label.opacity.animate(
                            now,
                            target,
                            Timing::new(timing.duration_ms).with_delay(start),
                            ease,
                            serial,
                        );
                    }
                }
            }
            SceneOp::Highlight(rule) => {
                for node in self.people.values_mut() {
                    node.is_highlight = match rule {
                        HighlightRule::All => true,
                        HighlightRule::Only(id) => node.datum.id == *id,
                        HighlightRule::None => false,
                    };
                }
            }
            SceneOp::Raise(filter) => {
                for id in self.selected(Selection::Merged, filter) {
                    self.raise(&id);
                }
            }
            SceneOp::Annotations {
                specs,
                duration_ms,
                delay_ms,
            } => {
                let serial = self.bump_serial();
                self.annotations.render(
                    now,
                    specs,
                    scales,
                    Timing::new(*duration_ms).with_delay(*delay_ms),
                    ease,
                    serial,
                );
            }
            SceneOp::Voronoi {
                entity_ids,
                diagram,
            } => {
                self.voronoi = Some(VoronoiOverlay {
                    entity_ids: entity_ids.clone(),
                    diagram: diagram.clone(),
                });
            }
            SceneOp::Gated(gate) => {
                let serial = watched_channel(&self.people, gate)
                    .and_then(Channel::active_serial);
                match serial {
                    Some(serial) => self.gates.push(PendingGate {
                        gate: gate.clone(),
                        serial,
                        scales: *scales,
                        ease,
                    }),
                    None => debug!(
                        entity = gate.entity_id.as_str(),
                        "gated phase dropped: nothing to wait on"
                    ),
                }
            }
        }
    }

    fn join(&mut self, entities: &[EntityView], exit_duration_ms: f64, ease: Ease) {
        let join = reconcile(
            self.people.keys().map(String::as_str),
            entities.iter().map(|view| view.id.as_str()),
        );

        for id in &join.exit {
            let serial = self.bump_serial();
            let now = self.now_ms;
            if let Some(node) = self.people.get_mut(id) {
                if node.exit_at.is_none() {
                    node.exit(now, exit_duration_ms, ease, serial);
                }
            }
        }

        for view in entities {
            match self.people.get_mut(&view.id) {
                Some(node) => node.rebind(view.clone()),
                None => {
                    let serial = self.bump_serial();
                    self.people
                        .insert(view.id.clone(), PersonNode::enter(serial, view.clone()));
                }
            }
        }

        trace!(
            enter = join.enter.len(),
            update = join.update.len(),
            exit = join.exit.len(),
            "people join"
        );
        self.entered = join.enter;
        self.updated = join.update;
    }

    fn selected(&self, selection: Selection, filter: &EntityFilter) -> Vec<String> {
        let entered: &[String] = match selection {
            Selection::Merged => &self.entered,
            Selection::Existing => &[],
        };
        entered
            .iter()
            .chain(self.updated.iter())
            .filter(|id| {
                self.people
                    .get(*id)
                    .is_some_and(|node| filter.matches(&node.datum))
            })
            .cloned()
            .collect()
    }

    fn animate_paths(&mut self, update: &PathUpdate, scales: &ScaleSet, ease: Ease) {
        let serial = self.bump_serial();
        let now = self.now_ms;
        let timing = update.timing;
        for id in self.selected(update.selection, &update.entities) {
            let Some(node) = self.people.get_mut(&id) else {
                continue;
            };
            match update.redraw {
                PathRedraw::Keep => {}
                PathRedraw::Tween => {
                    let line = node.path.line(scales);
                    node.path.d.animate(now, line, timing, ease, serial);
                }
                PathRedraw::AtEnd => {
                    let line = node.path.line(scales);
                    let swap = Timing::new(0.0).with_delay(timing.delay_ms + timing.duration_ms);
                    node.path.d.animate(now, line, swap, ease, serial);
                }
            }
            if let Some(offset) = update.dash_offset {
                node.path
                    .dash_offset
                    .animate(now, offset, timing, ease, serial);
            }
            if let Some(opacity) = update.opacity {
                node.path.opacity.animate(now, opacity, timing, ease, serial);
            }
        }
    }

    fn animate_circles(&mut self, animation: &CircleAnimation, scales: &ScaleSet, ease: Ease) {
        let serial = self.bump_serial();
        let now = self.now_ms;
        for id in self.selected(animation.selection, &animation.entities) {
            let Some(node) = self.people.get_mut(&id) else {
                continue;
            };
            let PersonNode { datum, circles, .. } = node;
            let count = circles
                .values()
                .filter(|circle| animation.circles.matches(&circle.point))
                .count();
            let matching = circles
                .values_mut()
                .filter(|circle| animation.circles.matches(&circle.point));
            for (index, circle) in matching.enumerate() {
                let delay = animation.delay.resolve(datum, index, count, ease)
                    + animation.timing.delay_ms;
                let timing = Timing::new(animation.timing.duration_ms).with_delay(delay);
                if let Some(rule) = animation.radius {
                    let target = rule.resolve(datum, Some(&circle.point), scales);
                    circle.radius.animate(now, target, timing, ease, serial);
                }
                if let Some(rule) = animation.stroke_width {
                    let target = rule.resolve(datum, Some(&circle.point), scales);
                    circle.stroke_width.animate(now, target, timing, ease, serial);
                }
                if let Some(rule) = animation.opacity {
                    let target = rule.resolve(datum, Some(&circle.point), scales);
                    circle.opacity.animate(now, target, timing, ease, serial);
                }
                if animation.reposition {
                    let (x, y) = scales.project(&circle.point);
                    circle.anchor = (x, y);
                    circle.x.animate(now, x, timing, ease, serial);
                    circle.y.animate(now, y, timing, ease, serial);
                }
            }
        }
    }

    /// Advances the clock by `delta_ms`.
    pub fn advance(&mut self, delta_ms: f64) {
        self.advance_to(self.now_ms + delta_ms.max(0.0));
    }

    /// Advances the clock to `target_ms`, firing gated phases in completion
    /// order and removing groups whose exit finished.
    pub fn advance_to(&mut self, target_ms: f64) {
        let target_ms = target_ms.max(self.now_ms);

        loop {
            let people = &self.people;
            self.gates
                .retain(|pending| watched_end(people, pending).is_some());

            let next = self
                .gates
                .iter()
                .enumerate()
                .filter_map(|(index, pending)| {
                    watched_end(&self.people, pending)
                        .filter(|end| *end <= target_ms)
                        .map(|end| (index, end))
                })
                .min_by(|left, right| left.1.total_cmp(&right.1));
            let Some((index, end)) = next else {
                break;
            };

            let pending = self.gates.remove(index);
            self.now_ms = self.now_ms.max(end);
            debug!(
                entity = pending.gate.entity_id.as_str(),
                at_ms = self.now_ms,
                ops = pending.gate.ops.len(),
                "gated phase fired"
            );
            self.apply_ops(&pending.gate.ops, &pending.scales, pending.ease);
        }

        self.now_ms = target_ms;
        let now = self.now_ms;
        self.axis.settle(now);
        self.annotations.settle(now);
        for node in self.people.values_mut() {
            node.settle(now);
        }

        let before = self.people.len();
        self.people
            .retain(|_, node| node.exit_at.is_none_or(|exit_at| exit_at > now));
        if self.people.len() != before {
            trace!(removed = before - self.people.len(), "exited groups removed");
        }
    }

    /// `true` while any transition or gated phase is pending.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.gates.is_empty()
            || self.axis.is_animating()
            || self.annotations.is_animating()
            || self
                .people
                .values()
                .any(|node| node.exit_at.is_some() || node.is_animating())
    }

    #[must_use]
    pub fn pending_gates(&self) -> usize {
        self.gates.len()
    }

    /// Entity ids in paint order.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<&str> {
        self.people.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn contains(&self, entity_id: &str) -> bool {
        self.people.contains_key(entity_id)
    }

    #[must_use]
    pub fn node_serial(&self, entity_id: &str) -> Option<u64> {
        self.people.get(entity_id).map(|node| node.serial)
    }

    #[must_use]
    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    #[must_use]
    pub fn has_voronoi(&self) -> bool {
        self.voronoi.is_some()
    }

    /// Sets `is_faded` on every group from `faded`.
    pub fn set_faded(&mut self, faded: impl Fn(&EntityView) -> bool) {
        for node in self.people.values_mut() {
            node.is_faded = faded(&node.datum);
        }
    }

    /// Marks one group active and clears the flag on every other group.
    pub fn set_active(&mut self, entity_id: Option<&str>) {
        for node in self.people.values_mut() {
            node.is_active = entity_id.is_some_and(|id| node.datum.id == id);
        }
    }

    /// Moves a group to the top of the paint order.
    pub fn raise(&mut self, entity_id: &str) {
        if let Some(node) = self.people.shift_remove(entity_id) {
            self.people.insert(entity_id.to_owned(), node);
        }
    }

    /// Plot-space anchor of the death-day marker of `entity_id`: the
    /// position its latest bind or reposition targets.
    #[must_use]
    pub fn death_day_anchor(&self, entity_id: &str) -> Option<(f64, f64)> {
        self.people
            .get(entity_id)
            .and_then(PersonNode::death_day_anchor)
    }

    /// Entity owning the hover cell under a plot-space point.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<&str> {
        let overlay = self.voronoi.as_ref()?;
        let index = overlay.diagram.find(point)?;
        overlay.entity_ids.get(index).map(String::as_str)
    }

    /// Samples every node at the current instant.
    #[must_use]
    pub fn frame(&self) -> RenderFrame {
        let now = self.now_ms;
        let mut frame = RenderFrame::new(self.layout.viewport, self.layout.margin);
        let (axis_lines, axis_texts) = self.axis.sample(now);
        frame.axis_lines = axis_lines;
        frame.axis_texts = axis_texts;
        frame.people = self.people.values().map(|node| node.sample(now)).collect();
        frame.annotations = self.annotations.sample(now);
        if let Some(overlay) = &self.voronoi {
            frame.voronoi = overlay
                .diagram
                .svg_paths()
                .into_iter()
                .zip(&overlay.entity_ids)
                .filter_map(|(d, entity_id)| {
                    d.map(|d| PolygonPrimitive {
                        entity_id: entity_id.clone(),
                        d,
                    })
                })
                .collect();
        }
        frame
    }
}

fn watched_channel<'a>(
    people: &'a IndexMap<String, PersonNode>,
    gate: &Gate,
) -> Option<&'a Channel<f64>> {
    let node = people.get(&gate.entity_id)?;
    match gate.target {
        WatchTarget::Path => Some(&node.path.opacity),
        WatchTarget::FirstCircle => node.circles.first().map(|(_, circle)| &circle.opacity),
    }
}

/// End instant of the watched transition, `None` once it was superseded or
/// its node is gone.
fn watched_end(people: &IndexMap<String, PersonNode>, pending: &PendingGate) -> Option<f64> {
    let channel = watched_channel(people, &pending.gate)?;
    if channel.active_serial() == Some(pending.serial) {
        channel.end_ms()
    } else {
        None
    }
}
