//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input series (`SeriesCode`, `ObservedSeries`) and aligned rows
//! - derived signal records (`InversionInterval`, `LinkRecord`, `SignalStats`)
//! - run configuration (`AnalysisConfig`, `FetchConfig`)

pub mod types;

pub use types::*;
