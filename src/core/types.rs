use serde::{Deserialize, Serialize};

/// Inner plot area in pixels, margins excluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 20.0,
            bottom: 40.0,
            left: 50.0,
            right: 50.0,
        }
    }
}

impl Margin {
    #[must_use]
    pub fn horizontal(self) -> f64 {
        self.left + self.right
    }

    #[must_use]
    pub fn vertical(self) -> f64 {
        self.top + self.bottom
    }
}

/// Raw host measurements the plot area is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width of the chart container, margins included.
    pub chart_width: f64,
    /// Height of the browser window (or host surface).
    pub window_height: f64,
}

impl WindowSize {
    #[must_use]
    pub fn new(chart_width: f64, window_height: f64) -> Self {
        Self {
            chart_width,
            window_height,
        }
    }
}
