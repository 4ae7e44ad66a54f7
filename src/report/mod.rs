//! Terminal reports for a finished analysis.

pub mod format;

pub use format::*;
