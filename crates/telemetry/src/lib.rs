//! Internal telemetry for the UTM dashboard.
//!
//! Structured logging via `tracing`, plus in-process counters and a health
//! registry surfaced through the `/health` endpoints.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
