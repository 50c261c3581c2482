//! narrative-rs: headless scroll-driven data narrative engine.
//!
//! The crate turns a small table of narrative steps into a retained scene
//! graph: every step plans absolute attribute targets, the scene tweens its
//! nodes towards them on a host-driven clock, and a [`render::Renderer`]
//! backend receives fully sampled frames.

pub mod animation;
pub mod api;
pub mod core;
pub mod error;
pub mod render;
pub mod telemetry;

pub use api::{NarrativeConfig, NarrativeSession, Step, StepContext};
pub use error::{NarrativeError, NarrativeResult};
