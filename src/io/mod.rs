//! Input/output helpers.
//!
//! - CSV ingest, column resolution and date alignment (`ingest`)
//! - workbook and flat CSV table exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
