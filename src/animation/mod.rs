//! Deterministic tweening primitives driven by the scene clock.

mod channel;
mod ease;

pub use channel::{Channel, Interpolate, Timing};
pub use ease::Ease;
