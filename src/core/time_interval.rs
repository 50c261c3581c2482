use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::core::primitives::day_start;
use crate::core::ticks::tick_step;

const SECOND_MS: f64 = 1_000.0;
const MINUTE_MS: f64 = SECOND_MS * 60.0;
const HOUR_MS: f64 = MINUTE_MS * 60.0;
const DAY_MS: f64 = HOUR_MS * 24.0;
const WEEK_MS: f64 = DAY_MS * 7.0;
const MONTH_MS: f64 = DAY_MS * 30.0;
const YEAR_MS: f64 = DAY_MS * 365.0;

/// Calendar interval used to nice time domains and generate time ticks.
///
/// Multi-step intervals align to their field (`Day(2)` lands on odd days of
/// the month, `Month(3)` on quarter starts, `Year(5)` on multiples of five).
/// All arithmetic is UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInterval {
    Millisecond(u32),
    Second(u32),
    Minute(u32),
    Hour(u32),
    Day(u32),
    /// Sunday-based weeks.
    Week,
    Month(u32),
    Year(u32),
}

const TICK_INTERVALS: [(TimeInterval, f64); 18] = [
    (TimeInterval::Second(1), SECOND_MS),
    (TimeInterval::Second(5), 5.0 * SECOND_MS),
    (TimeInterval::Second(15), 15.0 * SECOND_MS),
    (TimeInterval::Second(30), 30.0 * SECOND_MS),
    (TimeInterval::Minute(1), MINUTE_MS),
    (TimeInterval::Minute(5), 5.0 * MINUTE_MS),
    (TimeInterval::Minute(15), 15.0 * MINUTE_MS),
    (TimeInterval::Minute(30), 30.0 * MINUTE_MS),
    (TimeInterval::Hour(1), HOUR_MS),
    (TimeInterval::Hour(3), 3.0 * HOUR_MS),
    (TimeInterval::Hour(6), 6.0 * HOUR_MS),
    (TimeInterval::Hour(12), 12.0 * HOUR_MS),
    (TimeInterval::Day(1), DAY_MS),
    (TimeInterval::Day(2), 2.0 * DAY_MS),
    (TimeInterval::Week, WEEK_MS),
    (TimeInterval::Month(1), MONTH_MS),
    (TimeInterval::Month(3), 3.0 * MONTH_MS),
    (TimeInterval::Year(1), YEAR_MS),
];

impl TimeInterval {
    /// Picks the interval whose nominal length is closest to `span / count`.
    #[must_use]
    pub fn for_span(start_ms: f64, stop_ms: f64, count: usize) -> Self {
        let count = count.max(1) as f64;
        let target = (stop_ms - start_ms).abs() / count;
        let index = TICK_INTERVALS.partition_point(|(_, step)| *step <= target);

        if index == TICK_INTERVALS.len() {
            let step = tick_step(start_ms / YEAR_MS, stop_ms / YEAR_MS, count);
            return Self::Year(step.max(1.0) as u32);
        }
        if index == 0 {
            let step = tick_step(start_ms, stop_ms, count);
            return Self::Millisecond(step.max(1.0) as u32);
        }

        let (below, below_step) = TICK_INTERVALS[index - 1];
        let (above, above_step) = TICK_INTERVALS[index];
        if target / below_step < above_step / target {
            below
        } else {
            above
        }
    }

    /// Largest boundary `<= time`.
    #[must_use]
    pub fn floor(self, time: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Millisecond(step) => {
                let step = i64::from(step.max(1));
                let millis = time.timestamp_millis();
                from_millis(millis - millis.rem_euclid(step))
            }
            Self::Second(step) => {
                let base = truncate_to_second(time);
                base - Duration::seconds(i64::from(base.second() % step.max(1)))
            }
            Self::Minute(step) => {
                let base = truncate_to_second(time) - Duration::seconds(i64::from(time.second()));
                base - Duration::minutes(i64::from(base.minute() % step.max(1)))
            }
            Self::Hour(step) => {
                let base = day_start(time.date_naive()) + Duration::hours(i64::from(time.hour()));
                base - Duration::hours(i64::from(base.hour() % step.max(1)))
            }
            Self::Day(step) => {
                let date = time.date_naive();
                let back = (date.day() - 1) % step.max(1);
                day_start(date) - Duration::days(i64::from(back))
            }
            Self::Week => {
                let date = time.date_naive();
                let back = date.weekday().num_days_from_sunday();
                day_start(date) - Duration::days(i64::from(back))
            }
            Self::Month(step) => {
                let date = time.date_naive();
                let month0 = date.month0() - date.month0() % step.max(1);
                month_start(date.year(), month0)
            }
            Self::Year(step) => {
                let step = step.max(1) as i32;
                let year = time.year() - time.year().rem_euclid(step);
                month_start(year, 0)
            }
        }
    }

    /// Smallest boundary `>= time`.
    #[must_use]
    pub fn ceil(self, time: DateTime<Utc>) -> DateTime<Utc> {
        let floored = self.floor(time);
        if floored < time {
            self.offset(floored, 1)
        } else {
            floored
        }
    }

    /// Moves an aligned boundary by `count` steps.
    #[must_use]
    pub fn offset(self, time: DateTime<Utc>, count: i64) -> DateTime<Utc> {
        match self {
            Self::Millisecond(step) => time + Duration::milliseconds(count * i64::from(step.max(1))),
            Self::Second(step) => time + Duration::seconds(count * i64::from(step.max(1))),
            Self::Minute(step) => time + Duration::minutes(count * i64::from(step.max(1))),
            Self::Hour(step) => time + Duration::hours(count * i64::from(step.max(1))),
            Self::Day(step) => {
                // Day steps restart at the first of each month.
                let mut current = time;
                for _ in 0..count.max(0) {
                    let candidate = current + Duration::days(i64::from(step.max(1)));
                    current = if candidate.month() != current.month() {
                        month_start(candidate.year(), candidate.month0())
                    } else {
                        candidate
                    };
                }
                current
            }
            Self::Week => time + Duration::weeks(count),
            Self::Month(step) => {
                let months = i64::from(time.year()) * 12
                    + i64::from(time.month0())
                    + count * i64::from(step.max(1));
                month_start(months.div_euclid(12) as i32, months.rem_euclid(12) as u32)
            }
            Self::Year(step) => month_start(time.year() + (count * i64::from(step.max(1))) as i32, 0),
        }
    }

    /// Boundaries in `[start, stop)`.
    #[must_use]
    pub fn range(self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut values = Vec::new();
        let mut current = self.ceil(start);
        while current < stop {
            values.push(current);
            let next = self.offset(current, 1);
            if next <= current {
                break;
            }
            current = next;
        }
        values
    }
}

/// `true` when `time` sits exactly on a calendar year boundary.
#[must_use]
pub fn is_year_boundary(time: DateTime<Utc>) -> bool {
    TimeInterval::Year(1).floor(time) == time
}

fn month_start(year: i32, month0: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .map(day_start)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn truncate_to_second(time: DateTime<Utc>) -> DateTime<Utc> {
    from_millis(time.timestamp() * 1_000)
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::primitives::parse_day_stamp;

    #[test]
    fn two_month_span_picks_weeks() {
        let start = parse_day_stamp("20160301").expect("start");
        let stop = parse_day_stamp("20160426").expect("stop");
        let interval = TimeInterval::for_span(
            start.timestamp_millis() as f64,
            stop.timestamp_millis() as f64,
            10,
        );
        assert_eq!(interval, TimeInterval::Week);
    }

    #[test]
    fn month_range_is_half_open() {
        let start = parse_day_stamp("20160215").expect("start");
        let stop = parse_day_stamp("20160501").expect("stop");
        let months = TimeInterval::Month(1).range(start, stop);
        let labels: Vec<String> = months.iter().map(|m| m.format("%m").to_string()).collect();
        assert_eq!(labels, vec!["03", "04"]);
    }

    #[test]
    fn week_floor_lands_on_sunday() {
        let time = parse_day_stamp("20160302").expect("time");
        let floored = TimeInterval::Week.floor(time);
        assert_eq!(floored.weekday(), chrono::Weekday::Sun);
        assert!(floored <= time);
    }
}
