use serde::{Deserialize, Serialize};

use crate::error::{NarrativeError, NarrativeResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    pub fn validate(self) -> NarrativeResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(NarrativeError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// CSS `rgba(...)` notation.
    #[must_use]
    pub fn to_css(self) -> String {
        let byte = |value: f64| (value * 255.0).round() as u8;
        format!(
            "rgba({},{},{},{})",
            byte(self.red),
            byte(self.green),
            byte(self.blue),
            self.alpha
        )
    }
}

fn validate_opacity(opacity: f64, what: &str) -> NarrativeResult<()> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(NarrativeError::InvalidData(format!(
            "{what} opacity must be finite and in [0, 1]"
        )));
    }
    Ok(())
}

fn validate_point(x: f64, y: f64, what: &str) -> NarrativeResult<()> {
    if !x.is_finite() || !y.is_finite() {
        return Err(NarrativeError::InvalidData(format!(
            "{what} coordinates must be finite"
        )));
    }
    Ok(())
}

/// Draw command for one line segment in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePrimitive {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke_width: f64,
    pub color: Color,
}

impl LinePrimitive {
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64, stroke_width: f64, color: Color) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            stroke_width,
            color,
        }
    }

    pub fn validate(self) -> NarrativeResult<()> {
        validate_point(self.x1, self.y1, "line")?;
        validate_point(self.x2, self.y2, "line")?;
        if !self.stroke_width.is_finite() || self.stroke_width <= 0.0 {
            return Err(NarrativeError::InvalidData(
                "line stroke width must be finite and > 0".to_owned(),
            ));
        }
        self.color.validate()
    }
}

/// Horizontal text alignment relative to `TextPrimitive::x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextHAlign {
    Left,
    Center,
    Right,
}

/// Draw command for one label in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrimitive {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size_px: f64,
    pub color: Color,
    pub h_align: TextHAlign,
    pub opacity: f64,
}

impl TextPrimitive {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        x: f64,
        y: f64,
        font_size_px: f64,
        color: Color,
        h_align: TextHAlign,
    ) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size_px,
            color,
            h_align,
            opacity: 1.0,
        }
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn validate(&self) -> NarrativeResult<()> {
        if self.text.is_empty() {
            return Err(NarrativeError::InvalidData(
                "text primitive must not be empty".to_owned(),
            ));
        }
        validate_point(self.x, self.y, "text")?;
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(NarrativeError::InvalidData(
                "font size must be finite and > 0".to_owned(),
            ));
        }
        validate_opacity(self.opacity, "text")?;
        self.color.validate()
    }
}

/// Stroke-dash state of a timeline path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashPattern {
    pub dash: f64,
    pub gap: f64,
    pub offset: f64,
}

/// Timeline path of one entity. `d` is SVG path data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPrimitive {
    pub d: String,
    pub opacity: f64,
    pub dash: Option<DashPattern>,
}

impl PathPrimitive {
    pub fn validate(&self) -> NarrativeResult<()> {
        validate_opacity(self.opacity, "path")?;
        if let Some(dash) = self.dash {
            if !dash.dash.is_finite() || !dash.gap.is_finite() || !dash.offset.is_finite() {
                return Err(NarrativeError::InvalidData(
                    "path dash pattern must be finite".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// One pageview marker, keyed by its day timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CirclePrimitive {
    pub key: String,
    pub serial: u64,
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub stroke_width: f64,
    pub opacity: f64,
    pub is_death_day: bool,
    pub is_transparent: bool,
    pub is_active: bool,
}

impl CirclePrimitive {
    pub fn validate(&self) -> NarrativeResult<()> {
        validate_point(self.cx, self.cy, "circle")?;
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(NarrativeError::InvalidData(format!(
                "circle `{}` radius must be finite and >= 0",
                self.key
            )));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(NarrativeError::InvalidData(
                "circle stroke width must be finite and >= 0".to_owned(),
            ));
        }
        validate_opacity(self.opacity, "circle")
    }
}

/// Closed polygon, used by the hover tessellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonPrimitive {
    /// Entity the cell dispatches hover to.
    pub entity_id: String,
    pub d: String,
}
