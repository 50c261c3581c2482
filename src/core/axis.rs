use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::primitives::datetime_to_unix_millis;
use crate::core::ticks::format_si;
use crate::core::time_interval::{TimeInterval, is_year_boundary};
use crate::core::{LinearScale, TimeScale};

const Y_TICK_COUNT: usize = 5;
const Y_TICK_PRECISION: usize = 2;

/// One labeled tick; `value` is unix milliseconds on the time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTick {
    pub value: f64,
    pub label: String,
}

/// Tick cadence for the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeTickMode {
    /// One tick per calendar month.
    Monthly,
    /// Interval chosen from the domain span.
    Auto,
}

impl TimeTickMode {
    fn interval(self) -> Option<TimeInterval> {
        match self {
            Self::Monthly => Some(TimeInterval::Month(1)),
            Self::Auto => None,
        }
    }
}

/// Value-axis ticks with SI labels. The tick at `unit_index`, when present,
/// carries `unit_label` as a suffix.
#[must_use]
pub fn value_axis_ticks(scale: LinearScale, unit_label: &str, unit_index: usize) -> Vec<AxisTick> {
    scale
        .ticks(Y_TICK_COUNT)
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let formatted = format_si(value, Y_TICK_PRECISION);
            let label = if index == unit_index {
                format!("{formatted}{unit_label}")
            } else {
                formatted
            };
            AxisTick { value, label }
        })
        .collect()
}

#[must_use]
pub fn time_axis_ticks(scale: TimeScale, mode: TimeTickMode) -> Vec<AxisTick> {
    scale
        .ticks(mode.interval())
        .into_iter()
        .map(|time| AxisTick {
            value: datetime_to_unix_millis(time),
            label: time_tick_label(time),
        })
        .collect()
}

/// `%b` inside a year, `%Y` on the year boundary itself.
#[must_use]
pub fn time_tick_label(time: DateTime<Utc>) -> String {
    if is_year_boundary(time) {
        time.format("%Y").to_string()
    } else {
        time.format("%b").to_string()
    }
}
