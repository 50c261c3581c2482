use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::primitives::{datetime_to_unix_millis, unix_millis_to_datetime};
use crate::core::time_interval::TimeInterval;
use crate::error::{NarrativeError, NarrativeResult};

/// Time axis scale over UTC instants, stored as unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
}

impl TimeScale {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        range: (f64, f64),
    ) -> NarrativeResult<Self> {
        if !range.0.is_finite() || !range.1.is_finite() {
            return Err(NarrativeError::InvalidData(
                "time scale range must be finite".to_owned(),
            ));
        }
        Ok(Self {
            domain_start: datetime_to_unix_millis(start),
            domain_end: datetime_to_unix_millis(end),
            range_start: range.0,
            range_end: range.1,
        })
    }

    /// Snaps the domain outward to the calendar interval that yields roughly
    /// ten ticks.
    #[must_use]
    pub fn nice(self) -> Self {
        let interval = TimeInterval::for_span(self.domain_start, self.domain_end, 10);
        let (start, end) = self.domain();
        Self {
            domain_start: datetime_to_unix_millis(interval.floor(start)),
            domain_end: datetime_to_unix_millis(interval.ceil(end)),
            ..self
        }
    }

    #[must_use]
    pub fn domain(self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            unix_millis_to_datetime(self.domain_start),
            unix_millis_to_datetime(self.domain_end),
        )
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    #[must_use]
    pub fn apply(self, time: DateTime<Utc>) -> f64 {
        self.apply_millis(datetime_to_unix_millis(time))
    }

    #[must_use]
    pub fn apply_millis(self, millis: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        let t = if span == 0.0 {
            0.5
        } else {
            (millis - self.domain_start) / span
        };
        self.range_start + t * (self.range_end - self.range_start)
    }

    /// Ticks at an explicit interval, or at the automatic interval for
    /// roughly ten ticks when `interval` is `None`. Both ends are inclusive.
    #[must_use]
    pub fn ticks(self, interval: Option<TimeInterval>) -> Vec<DateTime<Utc>> {
        let (lo, hi) = if self.domain_start <= self.domain_end {
            (self.domain_start, self.domain_end)
        } else {
            (self.domain_end, self.domain_start)
        };
        let interval =
            interval.unwrap_or_else(|| TimeInterval::for_span(lo, hi, 10));
        interval.range(
            unix_millis_to_datetime(lo),
            unix_millis_to_datetime(hi + 1.0),
        )
    }
}
