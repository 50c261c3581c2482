use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::entity::PageviewPoint;
use crate::core::{LinearScale, SqrtScale, TimeScale, Viewport};
use crate::error::{NarrativeError, NarrativeResult};

/// Scales for one step, computed against that step's data window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleSet {
    pub x: TimeScale,
    pub y: LinearScale,
    pub r: Option<SqrtScale>,
}

impl ScaleSet {
    #[must_use]
    pub fn project(&self, point: &PageviewPoint) -> (f64, f64) {
        self.project_raw(point.date, point.views_adjusted)
    }

    #[must_use]
    pub fn project_raw(&self, date: DateTime<Utc>, value: f64) -> (f64, f64) {
        (self.x.apply(date), self.y.apply(value))
    }

    /// Magnitude radius, when the step carries a radius scale.
    #[must_use]
    pub fn radius(&self, value: f64) -> Option<f64> {
        self.r.map(|scale| scale.apply(value))
    }
}

/// Builds step scales from a data window and the current plot area.
///
/// Every builder falls back to `default_window` when handed an empty window,
/// so an empty step never produces an undefined domain.
#[derive(Debug, Clone, Copy)]
pub struct ScaleFactory<'a> {
    viewport: Viewport,
    radius_range: (f64, f64),
    default_window: &'a [PageviewPoint],
}

impl<'a> ScaleFactory<'a> {
    pub fn new(
        viewport: Viewport,
        radius_range: (f64, f64),
        default_window: &'a [PageviewPoint],
    ) -> NarrativeResult<Self> {
        if !viewport.is_valid() {
            return Err(NarrativeError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        if default_window.is_empty() {
            return Err(NarrativeError::EmptyWindow);
        }
        Ok(Self {
            viewport,
            radius_range,
            default_window,
        })
    }

    fn window<'w>(&'w self, window: &'w [PageviewPoint]) -> &'w [PageviewPoint] {
        if window.is_empty() {
            self.default_window
        } else {
            window
        }
    }

    /// Time scale over `extent(date)`, niced, onto `[0, width]`.
    pub fn x(&self, window: &[PageviewPoint]) -> NarrativeResult<TimeScale> {
        let window = self.window(window);
        let start = window.iter().map(|point| point.date).min();
        let end = window.iter().map(|point| point.date).max();
        let (Some(start), Some(end)) = (start, end) else {
            return Err(NarrativeError::EmptyWindow);
        };
        Ok(TimeScale::new(start, end, (0.0, self.viewport.width))?.nice())
    }

    /// Linear scale over `[0, max(views_adjusted)]`, niced, onto `[height, 0]`.
    ///
    /// A window without positive values gets the unit domain `[0, 1]`.
    pub fn y(&self, window: &[PageviewPoint]) -> NarrativeResult<LinearScale> {
        let window = self.window(window);
        let max = window
            .iter()
            .map(|point| OrderedFloat(point.views_adjusted))
            .filter(|value| value.0.is_finite())
            .max()
            .map_or(0.0, |value| value.0);
        let max = if max > 0.0 { max } else { 1.0 };
        Ok(LinearScale::new((0.0, max), (self.viewport.height, 0.0))?.nice())
    }

    /// Square-root radius scale over the extent of `magnitudes`.
    ///
    /// Returns `None` when no finite magnitude is available.
    pub fn r(
        &self,
        magnitudes: impl IntoIterator<Item = f64>,
    ) -> NarrativeResult<Option<SqrtScale>> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in magnitudes.into_iter().filter(|value| value.is_finite()) {
            min = min.min(value);
            max = max.max(value);
        }
        if !min.is_finite() || !max.is_finite() {
            return Ok(None);
        }
        Ok(Some(SqrtScale::new((min, max), self.radius_range)?.nice()))
    }

    /// Bundles `x` over `x_window`, `y` over `y_window` and an optional radius scale.
    pub fn scales(
        &self,
        x_window: &[PageviewPoint],
        y_window: &[PageviewPoint],
        r: Option<SqrtScale>,
    ) -> NarrativeResult<ScaleSet> {
        Ok(ScaleSet {
            x: self.x(x_window)?,
            y: self.y(y_window)?,
            r,
        })
    }
}
