use serde::{Deserialize, Serialize};

use crate::core::ticks::{nice_domain, ticks};
use crate::error::{NarrativeError, NarrativeResult};

/// Continuous linear mapping from a value domain onto a pixel range.
///
/// Ranges may be inverted (`[height, 0]`) so larger values land higher up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> NarrativeResult<Self> {
        validate_pair(domain, "scale domain")?;
        validate_pair(range, "scale range")?;
        Ok(Self {
            domain_start: domain.0,
            domain_end: domain.1,
            range_start: range.0,
            range_end: range.1,
        })
    }

    /// Rounds the domain outward to tick boundaries for roughly ten ticks.
    #[must_use]
    pub fn nice(self) -> Self {
        let (domain_start, domain_end) = nice_domain(self.domain_start, self.domain_end, 10);
        Self {
            domain_start,
            domain_end,
            ..self
        }
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    /// Maps a domain value to a pixel. A collapsed domain maps everything to
    /// the middle of the range.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        let t = if span == 0.0 {
            0.5
        } else {
            (value - self.domain_start) / span
        };
        self.range_start + t * (self.range_end - self.range_start)
    }

    #[must_use]
    pub fn invert(self, pixel: f64) -> f64 {
        let span = self.range_end - self.range_start;
        let t = if span == 0.0 {
            0.5
        } else {
            (pixel - self.range_start) / span
        };
        self.domain_start + t * (self.domain_end - self.domain_start)
    }

    #[must_use]
    pub fn ticks(self, count: usize) -> Vec<f64> {
        ticks(self.domain_start, self.domain_end, count)
    }
}

/// Square-root scale: the mapped value grows with the square root of the
/// input, so circle *area* stays proportional to magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SqrtScale {
    linear: LinearScale,
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> NarrativeResult<Self> {
        Ok(Self {
            linear: LinearScale::new(domain, range)?,
        })
    }

    #[must_use]
    pub fn nice(self) -> Self {
        Self {
            linear: self.linear.nice(),
        }
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        self.linear.domain()
    }

    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        let (start, end) = self.linear.domain();
        let (range_start, range_end) = self.linear.range();
        let transformed_start = signed_sqrt(start);
        let span = signed_sqrt(end) - transformed_start;
        let t = if span == 0.0 {
            0.5
        } else {
            (signed_sqrt(value) - transformed_start) / span
        };
        range_start + t * (range_end - range_start)
    }
}

fn signed_sqrt(value: f64) -> f64 {
    if value < 0.0 {
        -(-value).sqrt()
    } else {
        value.sqrt()
    }
}

fn validate_pair(pair: (f64, f64), name: &str) -> NarrativeResult<()> {
    if !pair.0.is_finite() || !pair.1.is_finite() {
        return Err(NarrativeError::InvalidData(format!(
            "{name} must be finite"
        )));
    }
    Ok(())
}
