//! Core types, categorization rules, and errors for the enrichment pipeline.

pub mod category;
pub mod error;
pub mod record;
pub mod tiers;

pub use category::*;
pub use error::{Error, FetchErrorCode, Result, TransformErrorCode, WriteErrorCode};
pub use record::*;
pub use tiers::*;
