mod config;
pub mod loader;
mod plan;
mod scroll;
mod session;
mod state;
mod step;
mod step_engine;
mod tooltip;

pub use config::{ComparisonEvent, NarrativeConfig};
pub use loader::{Cell, EntityMetadata, RawPageviewRow, build_store, clean_pageviews};
pub use plan::StepPlan;
pub use scroll::{ScrollDirection, ScrollEvent, ScrollRegion, ScrollTracker};
pub use session::{Filter, NarrativeSession};
pub use state::NarrativeState;
pub use step::{Durations, Step, StepContext};
pub use step_engine::{StepPlans, plan_single, plan_step};
pub use tooltip::TooltipEvent;
