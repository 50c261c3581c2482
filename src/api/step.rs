use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::NarrativeConfig;
use crate::error::NarrativeError;

/// Narrative steps in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Context,
    Lemonade,
    PrinceBefore,
    PrinceSpike,
    Others,
    Compare,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Context,
        Step::Lemonade,
        Step::PrinceBefore,
        Step::PrinceSpike,
        Step::Others,
        Step::Compare,
    ];

    /// Name carried by the step's prose block.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Lemonade => "lemonade",
            Self::PrinceBefore => "prince-before",
            Self::PrinceSpike => "prince-spike",
            Self::Others => "others",
            Self::Compare => "compare",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|step| *step == self)
            .unwrap_or_default()
    }

    /// Step that a forward entry fast-forwards through first.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Context => None,
            Self::Lemonade => Some(Self::Context),
            Self::PrinceBefore => Some(Self::Lemonade),
            Self::PrinceSpike => Some(Self::PrinceBefore),
            Self::Others => Some(Self::PrinceSpike),
            Self::Compare => Some(Self::Others),
        }
    }

    /// Step `delta` positions away, clamped to the table.
    #[must_use]
    pub fn offset(self, delta: isize) -> Self {
        let last = Self::ALL.len() - 1;
        let index = self.index().saturating_add_signed(delta).min(last);
        Self::ALL[index]
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Step {
    type Err = NarrativeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.name() == name)
            .ok_or_else(|| NarrativeError::InvalidData(format!("unknown step `{name}`")))
    }
}

/// Per-call input of a step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepContext {
    /// Entered while scrolling backwards.
    pub reverse: bool,
    /// Fast-forward without visible animation.
    pub leave: bool,
}

impl StepContext {
    #[must_use]
    pub const fn forward() -> Self {
        Self {
            reverse: false,
            leave: false,
        }
    }

    #[must_use]
    pub const fn backward() -> Self {
        Self {
            reverse: true,
            leave: false,
        }
    }

    #[must_use]
    pub const fn leave() -> Self {
        Self {
            reverse: false,
            leave: true,
        }
    }
}

/// Slow, medium and fast transition durations for one step call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Durations {
    pub slow: f64,
    pub medium: f64,
    pub fast: f64,
}

impl Durations {
    /// Leave zeroes every duration; reverse shortens the nominal one.
    #[must_use]
    pub fn for_context(config: &NarrativeConfig, context: StepContext) -> Self {
        let factor = if context.leave {
            0.0
        } else if context.reverse {
            config.reverse_factor
        } else {
            1.0
        };
        let slow = config.duration_ms * factor;
        Self {
            slow,
            medium: (slow * 0.33).floor(),
            fast: (slow * 0.1).floor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for step in Step::ALL {
            assert_eq!(step.name().parse::<Step>().expect("known step"), step);
        }
        assert!("epilogue".parse::<Step>().is_err());
    }

    #[test]
    fn offset_is_clamped() {
        assert_eq!(Step::Context.offset(-1), Step::Context);
        assert_eq!(Step::Compare.offset(3), Step::Compare);
        assert_eq!(Step::Lemonade.offset(2), Step::PrinceSpike);
    }

    #[test]
    fn durations_follow_context() {
        let config = NarrativeConfig::default();
        let forward = Durations::for_context(&config, StepContext::forward());
        assert_eq!(forward.slow, 3_000.0);
        assert_eq!(forward.medium, 990.0);
        assert_eq!(forward.fast, 300.0);

        let reverse = Durations::for_context(&config, StepContext::backward());
        assert!((reverse.slow - 1_000.0).abs() < 1e-9);
        assert!(reverse.fast < forward.fast);
        assert!(reverse.medium <= reverse.slow);

        let leave = Durations::for_context(
            &config,
            StepContext {
                reverse: true,
                leave: true,
            },
        );
        assert_eq!(leave.slow, 0.0);
        assert_eq!(leave.medium, 0.0);
        assert_eq!(leave.fast, 0.0);
    }
}
