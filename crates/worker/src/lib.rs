//! Scheduling and coordination for the enrichment pipeline.
//!
//! - Pipeline coordinator (fetch → bronze → gold, one iteration)
//! - Retry policy (bounded backoff for retryable fetch failures)
//! - Scheduler (fixed-interval loop with cooperative shutdown)

pub mod pipeline;
pub mod retry;
pub mod scheduler;

pub use pipeline::*;
pub use retry::*;
pub use scheduler::*;
