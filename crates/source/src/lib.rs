//! Client for the paginated enrichment source API.

pub mod client;
pub mod config;
pub mod health;
pub mod page;

pub use client::*;
pub use config::*;
pub use page::*;
