mod annotation_layer;
mod axis_layer;
mod entity_renderer;
mod frame;
mod null_renderer;
mod ops;
mod primitives;
mod reconcile;
mod scene;
mod svg_renderer;

pub use annotation_layer::{AnnotationLayer, AnnotationStyle, wrap_text};
pub use axis_layer::{AxisLayer, AxisStyle};
pub use frame::{AnnotationPrimitive, LabelPrimitive, PersonGroupPrimitive, RenderFrame};
pub use null_renderer::NullRenderer;
pub use ops::{
    AnnotationSpec, CircleAnimation, CircleFilter, DelayRule, EntityFilter, Gate, HighlightRule,
    PathRedraw, PathUpdate, SceneOp, ScenePlan, Selection, ValueRule, WatchTarget,
};
pub use primitives::{
    CirclePrimitive, Color, DashPattern, LinePrimitive, PathPrimitive, PolygonPrimitive,
    TextHAlign, TextPrimitive,
};
pub use reconcile::{Reconciliation, reconcile};
pub use scene::{Scene, SceneLayout};
pub use svg_renderer::{SvgPalette, SvgRenderer};

use crate::error::NarrativeResult;

/// Contract implemented by any rendering backend.
///
/// Backends receive a fully sampled, deterministic `RenderFrame` so drawing
/// code stays isolated from step planning and scroll handling.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> NarrativeResult<()>;
}
