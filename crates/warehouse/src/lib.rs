//! Postgres warehouse: bronze landing, gold promotion and read-back queries.

pub mod bronze;
pub mod client;
pub mod config;
pub mod gold;
pub mod health;
pub mod query;
mod rows;
pub mod schema;
pub mod store;

pub use bronze::{write_bronze, BronzeSummary};
pub use client::*;
pub use config::*;
pub use gold::{promote_bronze_to_gold, PromoteSummary};
pub use query::*;
pub use store::*;
