use serde::{Deserialize, Serialize};

use crate::api::{Durations, Step, StepContext};
use crate::render::ScenePlan;

/// Render instruction produced by one step handler call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepPlan {
    pub step: Step,
    pub context: StepContext,
    pub durations: Durations,
    pub scene: ScenePlan,
}

impl StepPlan {
    /// Number of scene ops, gated phases included.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.scene.ops.len()
    }
}
