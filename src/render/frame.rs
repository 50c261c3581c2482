use serde::{Deserialize, Serialize};

use crate::core::{Margin, Viewport};
use crate::error::{NarrativeError, NarrativeResult};
use crate::render::{
    CirclePrimitive, LinePrimitive, PathPrimitive, PolygonPrimitive, TextPrimitive,
};

/// Name label attached above an entity's marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPrimitive {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
}

/// Persistent per-entity group as sampled at frame time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonGroupPrimitive {
    pub entity_id: String,
    /// Scene node serial; stays the same for as long as the node survives.
    pub serial: u64,
    pub opacity: f64,
    pub is_highlight: bool,
    pub is_faded: bool,
    pub is_active: bool,
    pub path: Option<PathPrimitive>,
    pub circles: Vec<CirclePrimitive>,
    pub label: LabelPrimitive,
}

/// Callout-circle annotation with a connector and wrapped title lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPrimitive {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub connector: LinePrimitive,
    pub title: Vec<TextPrimitive>,
    pub opacity: f64,
}

/// Backend-agnostic scene for one narrative draw pass.
///
/// Axis primitives are in surface coordinates; people, annotations and
/// hover cells are in plot coordinates (offset by `margin`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub margin: Margin,
    pub axis_lines: Vec<LinePrimitive>,
    pub axis_texts: Vec<TextPrimitive>,
    pub people: Vec<PersonGroupPrimitive>,
    pub annotations: Vec<AnnotationPrimitive>,
    pub voronoi: Vec<PolygonPrimitive>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(viewport: Viewport, margin: Margin) -> Self {
        Self {
            viewport,
            margin,
            axis_lines: Vec::new(),
            axis_texts: Vec::new(),
            people: Vec::new(),
            annotations: Vec::new(),
            voronoi: Vec::new(),
        }
    }

    /// Full surface size, margins included.
    #[must_use]
    pub fn surface_size(&self) -> (f64, f64) {
        (
            self.viewport.width + self.margin.horizontal(),
            self.viewport.height + self.margin.vertical(),
        )
    }

    #[must_use]
    pub fn person(&self, entity_id: &str) -> Option<&PersonGroupPrimitive> {
        self.people.iter().find(|group| group.entity_id == entity_id)
    }

    pub fn validate(&self) -> NarrativeResult<()> {
        if !self.viewport.is_valid() {
            return Err(NarrativeError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }

        for line in &self.axis_lines {
            line.validate()?;
        }
        for text in &self.axis_texts {
            text.validate()?;
        }
        for group in &self.people {
            if !group.opacity.is_finite() || !(0.0..=1.0).contains(&group.opacity) {
                return Err(NarrativeError::InvalidData(format!(
                    "group `{}` opacity must be finite and in [0, 1]",
                    group.entity_id
                )));
            }
            if let Some(path) = &group.path {
                path.validate()?;
            }
            for circle in &group.circles {
                circle.validate()?;
            }
        }
        for annotation in &self.annotations {
            annotation.connector.validate()?;
            for line in &annotation.title {
                line.validate()?;
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
            && self.axis_lines.is_empty()
            && self.axis_texts.is_empty()
            && self.annotations.is_empty()
    }
}
