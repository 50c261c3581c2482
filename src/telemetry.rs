//! Opt-in tracing setup for hosts embedding `narrative-rs`.
//!
//! The library only emits `tracing` events (step entry, plan application,
//! gated phases, hover dispatch). Hosts either install their own subscriber
//! or call [`init_default_tracing`] with the `telemetry` feature enabled.

/// Environment variable read for filter directives before falling back to
/// `RUST_LOG`.
pub const LOG_ENV: &str = "NARRATIVE_LOG";

/// Installs a compact `tracing` subscriber filtered by [`LOG_ENV`], then
/// `RUST_LOG`, then `info`.
///
/// Returns `false` when the `telemetry` feature is disabled or a global
/// subscriber is already set.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing_with_default("info")
}

/// Same as [`init_default_tracing`] with a caller-chosen fallback directive,
/// e.g. `"narrative_rs=debug"`.
#[must_use]
pub fn init_tracing_with_default(fallback: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(fallback));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok()
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback;
        false
    }
}
