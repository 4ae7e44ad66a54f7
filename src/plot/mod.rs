//! Chart rendering.
//!
//! - fixed-grid text chart for plain terminal output (`ascii`)
//! - plotters drawing shared by the TUI and the SVG export (`chart`)

pub mod ascii;
pub mod chart;

pub use ascii::render_ascii_plot;
pub use chart::{ChartStyle, SpreadChartData, draw_spread_chart, render_svg};
