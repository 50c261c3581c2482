use indexmap::IndexMap;
use kurbo::BezPath;

use crate::animation::{Channel, Ease, Timing};
use crate::core::{EntityView, PageviewPoint, ScaleSet, build_line_path, path_length};
use crate::render::reconcile::reconcile;
use crate::render::{
    CirclePrimitive, DashPattern, LabelPrimitive, PathPrimitive, PersonGroupPrimitive,
};

/// Timeline path of one group.
///
/// `bound` is the data the path was last bound to; it can lag behind the
/// group datum until the next bind.
#[derive(Debug, Clone)]
pub(crate) struct PathNode {
    pub bound: Vec<PageviewPoint>,
    pub d: Channel<BezPath>,
    pub opacity: Channel<f64>,
    pub dash: Option<f64>,
    pub dash_offset: Channel<f64>,
}

impl PathNode {
    fn empty() -> Self {
        Self {
            bound: Vec::new(),
            d: Channel::new(BezPath::new()),
            opacity: Channel::new(1.0),
            dash: None,
            dash_offset: Channel::new(0.0),
        }
    }

    /// Current rendered length.
    pub fn length(&self, now_ms: f64) -> f64 {
        path_length(&self.d.sample(now_ms))
    }

    pub fn line(&self, scales: &ScaleSet) -> BezPath {
        build_line_path(&self.bound, scales)
    }

    fn settle(&mut self, now_ms: f64) {
        self.d.settle(now_ms);
        self.opacity.settle(now_ms);
        self.dash_offset.settle(now_ms);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CircleNode {
    pub serial: u64,
    pub point: PageviewPoint,
    pub x: Channel<f64>,
    pub y: Channel<f64>,
    pub radius: Channel<f64>,
    pub stroke_width: Channel<f64>,
    pub opacity: Channel<f64>,
    /// Projected position under the scales of the last bind or reposition.
    pub anchor: (f64, f64),
    /// Fixed when the circle enters.
    pub not_death_index: bool,
    pub is_transparent: bool,
    pub is_active: bool,
}

impl CircleNode {
    fn enter(serial: u64, point: PageviewPoint, anchor: (f64, f64), radius: f64) -> Self {
        Self {
            serial,
            not_death_index: !point.is_death_day(),
            point,
            x: Channel::new(anchor.0),
            y: Channel::new(anchor.1),
            radius: Channel::new(radius),
            stroke_width: Channel::new(radius / 2.0),
            opacity: Channel::new(1.0),
            anchor,
            is_transparent: false,
            is_active: false,
        }
    }

    fn settle(&mut self, now_ms: f64) {
        self.x.settle(now_ms);
        self.y.settle(now_ms);
        self.radius.settle(now_ms);
        self.stroke_width.settle(now_ms);
        self.opacity.settle(now_ms);
    }

    fn sample(&self, now_ms: f64) -> CirclePrimitive {
        CirclePrimitive {
            key: self.point.timestamp.clone(),
            serial: self.serial,
            cx: self.x.sample(now_ms),
            cy: self.y.sample(now_ms),
            radius: self.radius.sample(now_ms).max(0.0),
            stroke_width: self.stroke_width.sample(now_ms).max(0.0),
            opacity: self.opacity.sample(now_ms).clamp(0.0, 1.0),
            is_death_day: !self.not_death_index,
            is_transparent: self.is_transparent,
            is_active: self.is_active,
        }
    }
}

/// Background and foreground name label; both share position and opacity.
#[derive(Debug, Clone)]
pub(crate) struct LabelNode {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub opacity: Channel<f64>,
}

/// Persistent group for one entity id.
#[derive(Debug, Clone)]
pub(crate) struct PersonNode {
    pub serial: u64,
    pub datum: EntityView,
    pub opacity: Channel<f64>,
    /// Scheduled removal instant while the group is fading out.
    pub exit_at: Option<f64>,
    pub is_highlight: bool,
    pub is_faded: bool,
    pub is_active: bool,
    pub path: PathNode,
    pub circles: IndexMap<String, CircleNode>,
    pub label: LabelNode,
}

impl PersonNode {
    pub fn enter(serial: u64, datum: EntityView) -> Self {
        let label = LabelNode {
            text: datum.display_name.clone(),
            x: 0.0,
            y: 0.0,
            opacity: Channel::new(0.0),
        };
        Self {
            serial,
            datum,
            opacity: Channel::new(1.0),
            exit_at: None,
            is_highlight: false,
            is_faded: false,
            is_active: false,
            path: PathNode::empty(),
            circles: IndexMap::new(),
            label,
        }
    }

    /// Rebinds the datum; a group that was fading out is kept alive.
    pub fn rebind(&mut self, datum: EntityView) {
        self.datum = datum;
        if self.exit_at.take().is_some() {
            self.opacity.snap(1.0);
        }
    }

    pub fn exit(&mut self, now_ms: f64, duration_ms: f64, ease: Ease, serial: u64) {
        self.opacity
            .animate(now_ms, 0.0, Timing::new(duration_ms), ease, serial);
        self.exit_at = Some(now_ms + duration_ms.max(0.0));
    }

    /// Binds the group's pageviews to its path when there is more than one
    /// point. `redraw` also snaps the geometry to the new line.
    pub fn bind_path(&mut self, scales: &ScaleSet, redraw: bool) {
        if self.datum.pageviews.len() <= 1 {
            return;
        }
        self.path.bound = self.datum.pageviews.clone();
        if redraw {
            let line = self.path.line(scales);
            self.path.d.snap(line);
        }
    }

    /// Keyed circle join on the point timestamp. Removed circles go at once;
    /// entering circles start at their projected position with `enter_radius`.
    pub fn bind_circles(
        &mut self,
        scales: &ScaleSet,
        named: &[String],
        enter_radius: f64,
        next_serial: &mut impl FnMut() -> u64,
    ) {
        let named_entity = named.iter().any(|id| *id == self.datum.id);
        let points: Vec<&PageviewPoint> = self
            .datum
            .pageviews
            .iter()
            .filter(|point| named_entity || point.is_death_day())
            .collect();

        let join = reconcile(
            self.circles.keys().map(String::as_str),
            points.iter().map(|point| point.timestamp.as_str()),
        );
        for key in &join.exit {
            self.circles.shift_remove(key);
        }

        let mut seen = std::collections::HashSet::new();
        for point in points {
            if !seen.insert(point.timestamp.as_str()) {
                continue;
            }
            let anchor = scales.project(point);
            match self.circles.get_mut(&point.timestamp) {
                Some(circle) => {
                    circle.point = point.clone();
                    circle.anchor = anchor;
                }
                None => {
                    let circle =
                        CircleNode::enter(next_serial(), point.clone(), anchor, enter_radius);
                    self.circles.insert(point.timestamp.clone(), circle);
                }
            }
        }
    }

    /// Anchor of the death-day marker, if the group has one.
    pub fn death_day_anchor(&self) -> Option<(f64, f64)> {
        self.circles
            .values()
            .find(|circle| circle.point.is_death_day())
            .map(|circle| circle.anchor)
    }

    pub fn is_animating(&self) -> bool {
        self.opacity.is_animating()
            || self.label.opacity.is_animating()
            || self.path.d.is_animating()
            || self.path.opacity.is_animating()
            || self.path.dash_offset.is_animating()
            || self.circles.values().any(|circle| {
                circle.x.is_animating()
                    || circle.y.is_animating()
                    || circle.radius.is_animating()
                    || circle.stroke_width.is_animating()
                    || circle.opacity.is_animating()
            })
    }

    pub fn settle(&mut self, now_ms: f64) {
        self.opacity.settle(now_ms);
        self.path.settle(now_ms);
        for circle in self.circles.values_mut() {
            circle.settle(now_ms);
        }
        self.label.opacity.settle(now_ms);
    }

    pub fn sample(&self, now_ms: f64) -> PersonGroupPrimitive {
        let d = self.path.d.sample(now_ms);
        let path = (!d.elements().is_empty()).then(|| PathPrimitive {
            d: d.to_svg(),
            opacity: self.path.opacity.sample(now_ms).clamp(0.0, 1.0),
            dash: self.path.dash.map(|length| DashPattern {
                dash: length,
                gap: length,
                offset: self.path.dash_offset.sample(now_ms),
            }),
        });

        PersonGroupPrimitive {
            entity_id: self.datum.id.clone(),
            serial: self.serial,
            opacity: self.opacity.sample(now_ms).clamp(0.0, 1.0),
            is_highlight: self.is_highlight,
            is_faded: self.is_faded,
            is_active: self.is_active,
            path,
            circles: self
                .circles
                .values()
                .map(|circle| circle.sample(now_ms))
                .collect(),
            label: LabelPrimitive {
                text: self.label.text.clone(),
                x: self.label.x,
                y: self.label.y,
                opacity: self.label.opacity.sample(now_ms).clamp(0.0, 1.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::primitives::parse_day_stamp;
    use crate::core::{LinearScale, TimeScale};

    fn point(stamp: &str, index: i32) -> PageviewPoint {
        PageviewPoint {
            entity_id: "p".to_owned(),
            date: parse_day_stamp(stamp).expect("stamp"),
            timestamp: stamp.to_owned(),
            views_adjusted: 10.0,
            bin_death_index: Some(index),
            death_views_adjusted_2: 10.0,
        }
    }

    fn view(points: Vec<PageviewPoint>) -> EntityView {
        EntityView {
            id: "p".to_owned(),
            display_name: "P".to_owned(),
            pageviews: points,
            timestamp_of_death: None,
            perspective_show: false,
            load_index: 0,
            magnitude: None,
        }
    }

    fn scales() -> ScaleSet {
        ScaleSet {
            x: TimeScale::new(
                parse_day_stamp("20160301").expect("start"),
                parse_day_stamp("20160310").expect("end"),
                (0.0, 90.0),
            )
            .expect("x"),
            y: LinearScale::new((0.0, 20.0), (100.0, 0.0)).expect("y"),
            r: None,
        }
    }

    #[test]
    fn unnamed_entities_only_get_a_death_day_circle() {
        let mut serial = 0;
        let mut next = || {
            serial += 1;
            serial
        };
        let mut node = PersonNode::enter(
            1,
            view(vec![point("20160302", -1), point("20160303", 0)]),
        );
        node.bind_circles(&scales(), &[], 0.0, &mut next);
        assert_eq!(node.circles.len(), 1);
        assert!(node.circles.contains_key("20160303"));

        node.bind_circles(&scales(), &["p".to_owned()], 0.0, &mut next);
        assert_eq!(node.circles.len(), 2);
    }

    #[test]
    fn single_point_does_not_rebind_path() {
        let mut node = PersonNode::enter(1, view(vec![point("20160302", 0)]));
        node.bind_path(&scales(), true);
        assert!(node.path.bound.is_empty());
        assert!(node.path.d.sample(0.0).elements().is_empty());
    }
}
