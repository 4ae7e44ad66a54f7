//! Remote data sources.

pub mod fred;

pub use fred::{FredClient, fetch_inputs};
