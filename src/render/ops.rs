use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::animation::{Ease, Timing};
use crate::core::{AxisTick, EntityView, PageviewPoint, ScaleSet, VoronoiDiagram};

/// Which part of the last join an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Entering and updated groups.
    Merged,
    /// Only groups that already existed before the join.
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityFilter {
    All,
    Only(String),
    /// Entities flagged for a name label.
    PerspectiveShow,
}

impl EntityFilter {
    #[must_use]
    pub fn matches(&self, view: &EntityView) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => view.id == *id,
            Self::PerspectiveShow => view.perspective_show,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircleFilter {
    All,
    /// The single circle keyed by this day timestamp.
    Timestamp(String),
}

impl CircleFilter {
    #[must_use]
    pub fn matches(&self, point: &PageviewPoint) -> bool {
        match self {
            Self::All => true,
            Self::Timestamp(stamp) => point.timestamp == *stamp,
        }
    }
}

/// Target value of a circle or label attribute, resolved per datum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ValueRule {
    Fixed(f64),
    /// `death_day` on the death-day point, `other` elsewhere.
    DeathDay { death_day: f64, other: f64 },
    /// Radius scale applied to the point's value; `fallback` without a scale.
    Magnitude { fallback: f64 },
    /// `shown` for entities flagged for a label, `hidden` otherwise.
    PerspectiveShow { shown: f64, hidden: f64 },
}

impl ValueRule {
    #[must_use]
    pub fn resolve(self, view: &EntityView, point: Option<&PageviewPoint>, scales: &ScaleSet) -> f64 {
        match self {
            Self::Fixed(value) => value,
            Self::DeathDay { death_day, other } => {
                if point.is_some_and(PageviewPoint::is_death_day) {
                    death_day
                } else {
                    other
                }
            }
            Self::Magnitude { fallback } => point
                .and_then(|point| scales.radius(point.views_adjusted))
                .filter(|radius| radius.is_finite())
                .map_or(fallback, |radius| radius.max(0.0)),
            Self::PerspectiveShow { shown, hidden } => {
                if view.perspective_show {
                    shown
                } else {
                    hidden
                }
            }
        }
    }
}

/// Per-element start delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DelayRule {
    None,
    Fixed(f64),
    /// `span * ease(index / count)` over the circles of one group.
    EasedIndex { span: f64 },
    /// `span * load_index / population`.
    LoadOrder { span: f64, population: usize },
    /// `delay` for one entity, `otherwise` for the rest.
    ForEntity {
        entity_id: String,
        delay: f64,
        otherwise: f64,
    },
}

impl DelayRule {
    #[must_use]
    pub fn resolve(&self, view: &EntityView, index: usize, count: usize, ease: Ease) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Fixed(delay) => *delay,
            Self::EasedIndex { span } => {
                if count == 0 {
                    0.0
                } else {
                    span * ease.apply(index as f64 / count as f64)
                }
            }
            Self::LoadOrder { span, population } => {
                if *population == 0 {
                    0.0
                } else {
                    span * view.load_index as f64 / *population as f64
                }
            }
            Self::ForEntity {
                entity_id,
                delay,
                otherwise,
            } => {
                if view.id == *entity_id {
                    *delay
                } else {
                    *otherwise
                }
            }
        }
    }
}

/// What happens to a path's geometry during an animated update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathRedraw {
    Keep,
    /// Morph towards the line through the bound points under the new scales.
    Tween,
    /// Swap to the new line once the transition finishes.
    AtEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HighlightRule {
    All,
    Only(String),
    None,
}

/// Channel a gated phase waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchTarget {
    /// Opacity transition of the entity's path.
    Path,
    /// Opacity transition of the entity's first circle.
    FirstCircle,
}

/// Ops deferred until the watched transition completes. Dropped when the
/// watched transition is superseded or its node disappears first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub entity_id: String,
    pub target: WatchTarget,
    pub ops: Vec<SceneOp>,
}

/// Anchored callout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSpec {
    pub date: DateTime<Utc>,
    pub value: f64,
    pub title: String,
    pub padding: f64,
    pub dx: f64,
    pub dy: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleAnimation {
    pub selection: Selection,
    pub entities: EntityFilter,
    pub circles: CircleFilter,
    pub timing: Timing,
    pub delay: DelayRule,
    pub radius: Option<ValueRule>,
    pub stroke_width: Option<ValueRule>,
    pub opacity: Option<ValueRule>,
    /// Move circles to their datum's position under the plan scales.
    pub reposition: bool,
}

impl CircleAnimation {
    #[must_use]
    pub fn new(selection: Selection, entities: EntityFilter, timing: Timing) -> Self {
        Self {
            selection,
            entities,
            circles: CircleFilter::All,
            timing,
            delay: DelayRule::None,
            radius: None,
            stroke_width: None,
            opacity: None,
            reposition: false,
        }
    }

    #[must_use]
    pub fn with_circles(mut self, circles: CircleFilter) -> Self {
        self.circles = circles;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: DelayRule) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_radius(mut self, rule: ValueRule) -> Self {
        self.radius = Some(rule);
        self
    }

    #[must_use]
    pub fn with_stroke_width(mut self, rule: ValueRule) -> Self {
        self.stroke_width = Some(rule);
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, rule: ValueRule) -> Self {
        self.opacity = Some(rule);
        self
    }

    #[must_use]
    pub fn repositioned(mut self) -> Self {
        self.reposition = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathUpdate {
    pub selection: Selection,
    pub entities: EntityFilter,
    pub timing: Timing,
    pub redraw: PathRedraw,
    pub dash_offset: Option<f64>,
    pub opacity: Option<f64>,
}

impl PathUpdate {
    #[must_use]
    pub fn new(selection: Selection, entities: EntityFilter, timing: Timing) -> Self {
        Self {
            selection,
            entities,
            timing,
            redraw: PathRedraw::Keep,
            dash_offset: None,
            opacity: None,
        }
    }

    #[must_use]
    pub fn with_redraw(mut self, redraw: PathRedraw) -> Self {
        self.redraw = redraw;
        self
    }

    #[must_use]
    pub fn with_dash_offset(mut self, offset: f64) -> Self {
        self.dash_offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

/// One retained-scene instruction. Ops are applied in order at the scene
/// clock's current instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneOp {
    Axis {
        duration_ms: f64,
        y_ticks: Vec<AxisTick>,
        x_ticks: Vec<AxisTick>,
    },
    /// Keyed join of the people layer.
    Join {
        entities: Vec<EntityView>,
        exit_duration_ms: f64,
    },
    /// Binds each group's pageviews to its path when it has more than one
    /// point; `redraw` also snaps the geometry.
    BindPaths {
        selection: Selection,
        entities: EntityFilter,
        redraw: bool,
    },
    /// Keyed join of circles. Every point of a `named` entity qualifies,
    /// other entities only contribute their death-day point.
    BindCircles {
        selection: Selection,
        entities: EntityFilter,
        named: Vec<String>,
        enter_radius: f64,
    },
    /// Dash the path with its full length and hide it behind the offset.
    ResetDash { entities: EntityFilter },
    /// Rebind and redraw the path, then dash it with its new length. With
    /// `reveal` the previously visible length stays visible.
    ExtendReveal { entities: EntityFilter, reveal: bool },
    AnimatePaths(PathUpdate),
    /// Immediate path attributes; `clear_dash` removes the dash pattern.
    SetPaths {
        update: PathUpdate,
        clear_dash: bool,
    },
    SnapCircleRadius { entities: EntityFilter, radius: f64 },
    AnimateCircles(CircleAnimation),
    SetCircleActive(bool),
    /// Flags every circle that is not a death-day marker as transparent.
    MarkTransparent,
    /// Positions labels above the first point of each group.
    PlaceLabels { selection: Selection },
    AnimateLabels {
        selection: Selection,
        timing: Timing,
        delay: DelayRule,
        opacity: ValueRule,
    },
    Highlight(HighlightRule),
    /// Moves matching groups to the top of the paint order.
    Raise(EntityFilter),
    Annotations {
        specs: Vec<AnnotationSpec>,
        duration_ms: f64,
        delay_ms: f64,
    },
    /// Replaces the hover tessellation; `entity_ids[i]` owns cell `i`.
    Voronoi {
        entity_ids: Vec<String>,
        diagram: VoronoiDiagram,
    },
    Gated(Gate),
}

/// Ops plus the scales and easing they resolve against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePlan {
    pub scales: ScaleSet,
    pub ease: Ease,
    pub ops: Vec<SceneOp>,
}

impl ScenePlan {
    #[must_use]
    pub fn new(scales: ScaleSet, ease: Ease) -> Self {
        Self {
            scales,
            ease,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: SceneOp) {
        self.ops.push(op);
    }
}
