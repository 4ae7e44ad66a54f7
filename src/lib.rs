//! `yc-recession` library crate.
//!
//! The binary (`yc`) is a thin wrapper around this library so that the whole
//! pipeline is testable without spawning processes or touching a terminal.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod signal;
pub mod tui;
