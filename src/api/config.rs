use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::animation::Ease;
use crate::core::Margin;
use crate::core::primitives::parse_day_stamp;
use crate::error::{NarrativeError, NarrativeResult};

/// A real-world event plotted as a callout in the compare step.
///
/// The plotted value is `pageviews / total_pageviews * median`, which puts
/// events from different years on the same normalized footing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEvent {
    pub title: String,
    pub date: DateTime<Utc>,
    pub pageviews: f64,
    pub total_pageviews: f64,
    /// Horizontal note offset as a fraction of the plot width.
    pub dx_ratio: f64,
    /// Vertical note offset as a fraction of the plot width.
    pub dy_ratio: f64,
}

/// Public session bootstrap configuration.
///
/// This type is serializable so hosts can ship the narrative setup as JSON
/// next to the data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeConfig {
    #[serde(default)]
    pub margin: Margin,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_min_radius")]
    pub min_radius: f64,
    #[serde(default = "default_max_radius")]
    pub max_radius: f64,
    /// Nominal duration of a slow transition.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: f64,
    /// Duration multiplier applied when scrolling backwards.
    #[serde(default = "default_reverse_factor")]
    pub reverse_factor: f64,
    #[serde(default)]
    pub ease: Ease,
    /// Share of the window height given to the chart, margins included.
    #[serde(default = "default_chart_height_ratio")]
    pub chart_height_ratio: f64,
    /// Trigger line of the step regions as a fraction of the window height.
    #[serde(default = "default_step_offset")]
    pub step_offset: f64,
    #[serde(default = "default_hover_offset")]
    pub hover_offset: f64,
    #[serde(default = "default_focus_id")]
    pub focus_id: String,
    #[serde(default = "default_comparison_id")]
    pub comparison_id: String,
    /// Day key of the comparison entity's release marker.
    #[serde(default = "default_release_timestamp")]
    pub release_timestamp: String,
    #[serde(default = "default_release_title")]
    pub release_title: String,
    /// Inclusive start of the comparison window.
    #[serde(default = "default_date_start")]
    pub date_start: DateTime<Utc>,
    /// Exclusive end of the comparison window.
    #[serde(default = "default_date_end")]
    pub date_end: DateTime<Utc>,
    #[serde(default = "default_compare_trim_start")]
    pub compare_trim_start: i32,
    #[serde(default = "default_value_unit_label")]
    pub value_unit_label: String,
    #[serde(default = "default_value_unit_tick")]
    pub value_unit_tick: usize,
    #[serde(default = "default_annotation_wrap")]
    pub annotation_wrap: f64,
    #[serde(default = "default_comparison_median")]
    pub comparison_median: f64,
    #[serde(default = "default_comparison_events")]
    pub comparison_events: Vec<ComparisonEvent>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            margin: Margin::default(),
            font_size: default_font_size(),
            min_radius: default_min_radius(),
            max_radius: default_max_radius(),
            duration_ms: default_duration_ms(),
            reverse_factor: default_reverse_factor(),
            ease: Ease::default(),
            chart_height_ratio: default_chart_height_ratio(),
            step_offset: default_step_offset(),
            hover_offset: default_hover_offset(),
            focus_id: default_focus_id(),
            comparison_id: default_comparison_id(),
            release_timestamp: default_release_timestamp(),
            release_title: default_release_title(),
            date_start: default_date_start(),
            date_end: default_date_end(),
            compare_trim_start: default_compare_trim_start(),
            value_unit_label: default_value_unit_label(),
            value_unit_tick: default_value_unit_tick(),
            annotation_wrap: default_annotation_wrap(),
            comparison_median: default_comparison_median(),
            comparison_events: default_comparison_events(),
        }
    }
}

impl NarrativeConfig {
    /// Parses a config from JSON; absent fields take their defaults.
    pub fn from_json_str(input: &str) -> NarrativeResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> NarrativeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sets the focus entity the narrative zooms in on.
    #[must_use]
    pub fn with_focus_id(mut self, focus_id: impl Into<String>) -> Self {
        self.focus_id = focus_id.into();
        self
    }

    /// Sets the id given to the date-windowed comparison entity.
    #[must_use]
    pub fn with_comparison_id(mut self, comparison_id: impl Into<String>) -> Self {
        self.comparison_id = comparison_id.into();
        self
    }

    #[must_use]
    pub fn with_release_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.release_timestamp = timestamp.into();
        self
    }

    /// Sets the comparison window `[start, end)`.
    #[must_use]
    pub fn with_date_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.date_start = start;
        self.date_end = end;
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub fn with_radius_range(mut self, min_radius: f64, max_radius: f64) -> Self {
        self.min_radius = min_radius;
        self.max_radius = max_radius;
        self
    }

    #[must_use]
    pub fn with_comparison_events(mut self, events: Vec<ComparisonEvent>) -> Self {
        self.comparison_events = events;
        self
    }

    pub fn validate(&self) -> NarrativeResult<()> {
        for (name, value) in [
            ("font_size", self.font_size),
            ("duration_ms", self.duration_ms),
            ("annotation_wrap", self.annotation_wrap),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(NarrativeError::InvalidConfig(format!(
                    "`{name}` must be finite and > 0"
                )));
            }
        }
        for (name, value) in [
            ("margin.top", self.margin.top),
            ("margin.bottom", self.margin.bottom),
            ("margin.left", self.margin.left),
            ("margin.right", self.margin.right),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(NarrativeError::InvalidConfig(format!(
                    "`{name}` must be finite and >= 0"
                )));
            }
        }
        if !self.min_radius.is_finite()
            || !self.max_radius.is_finite()
            || self.min_radius < 0.0
            || self.max_radius < self.min_radius
        {
            return Err(NarrativeError::InvalidConfig(
                "radius range must satisfy 0 <= min_radius <= max_radius".to_owned(),
            ));
        }
        if !self.reverse_factor.is_finite() || !(0.0..=1.0).contains(&self.reverse_factor) {
            return Err(NarrativeError::InvalidConfig(
                "`reverse_factor` must be in [0, 1]".to_owned(),
            ));
        }
        if !self.chart_height_ratio.is_finite()
            || self.chart_height_ratio <= 0.0
            || self.chart_height_ratio > 1.0
        {
            return Err(NarrativeError::InvalidConfig(
                "`chart_height_ratio` must be in (0, 1]".to_owned(),
            ));
        }
        if !self.step_offset.is_finite() || !self.hover_offset.is_finite() {
            return Err(NarrativeError::InvalidConfig(
                "scroll offsets must be finite".to_owned(),
            ));
        }
        if self.focus_id.is_empty() || self.comparison_id.is_empty() {
            return Err(NarrativeError::InvalidConfig(
                "focus and comparison ids must not be empty".to_owned(),
            ));
        }
        if self.focus_id == self.comparison_id {
            return Err(NarrativeError::InvalidConfig(
                "focus and comparison ids must differ".to_owned(),
            ));
        }
        if self.date_end <= self.date_start {
            return Err(NarrativeError::InvalidConfig(
                "`date_end` must be after `date_start`".to_owned(),
            ));
        }
        if self.compare_trim_start > 0 {
            return Err(NarrativeError::InvalidConfig(
                "`compare_trim_start` must be <= 0".to_owned(),
            ));
        }
        if !self.comparison_median.is_finite() {
            return Err(NarrativeError::InvalidConfig(
                "`comparison_median` must be finite".to_owned(),
            ));
        }
        for event in &self.comparison_events {
            if !event.total_pageviews.is_finite() || event.total_pageviews <= 0.0 {
                return Err(NarrativeError::InvalidConfig(format!(
                    "comparison event `{}` needs a positive total",
                    event.title
                )));
            }
        }
        Ok(())
    }
}

fn default_font_size() -> f64 {
    12.0
}

fn default_min_radius() -> f64 {
    4.0
}

fn default_max_radius() -> f64 {
    16.0
}

fn default_duration_ms() -> f64 {
    3_000.0
}

fn default_reverse_factor() -> f64 {
    1.0 / 3.0
}

fn default_chart_height_ratio() -> f64 {
    0.8
}

fn default_step_offset() -> f64 {
    0.99
}

fn default_hover_offset() -> f64 {
    1.0
}

fn default_focus_id() -> String {
    "57317".to_owned()
}

fn default_comparison_id() -> String {
    "beyonce".to_owned()
}

fn default_release_timestamp() -> String {
    "20160425".to_owned()
}

fn default_release_title() -> String {
    "Lemonade is released".to_owned()
}

fn day(stamp: &str) -> DateTime<Utc> {
    parse_day_stamp(stamp).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn default_date_start() -> DateTime<Utc> {
    day("20160301")
}

fn default_date_end() -> DateTime<Utc> {
    day("20160427")
}

fn default_compare_trim_start() -> i32 {
    -50
}

fn default_value_unit_label() -> String {
    " adjusted pageviews".to_owned()
}

fn default_value_unit_tick() -> usize {
    6
}

fn default_annotation_wrap() -> f64 {
    120.0
}

fn default_comparison_median() -> f64 {
    251_794_497.0 * 2.0
}

fn default_comparison_events() -> Vec<ComparisonEvent> {
    vec![
        ComparisonEvent {
            title: "LeBron James (NBA Finals)".to_owned(),
            date: day("20160620"),
            pageviews: 1_354_216.0,
            total_pageviews: 500_201_369.0,
            dx_ratio: 0.01,
            dy_ratio: -0.07,
        },
        ComparisonEvent {
            title: "Donald Trump (inauguration)".to_owned(),
            date: day("20170120"),
            pageviews: 3_635_774.0,
            total_pageviews: 538_696_302.0,
            dx_ratio: 0.02,
            dy_ratio: -0.03,
        },
        ComparisonEvent {
            title: "Meghan Markle (royal wedding)".to_owned(),
            date: day("20180519"),
            pageviews: 4_503_531.0,
            total_pageviews: 530_076_204.0,
            dx_ratio: -0.05,
            dy_ratio: -0.05,
        },
    ]
}
