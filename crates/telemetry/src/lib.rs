//! Internal telemetry for the enrichment pipeline.
//!
//! Metrics live in-process and are logged as a snapshot after every
//! iteration; there is no external metrics backend.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
