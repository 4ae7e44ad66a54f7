//! Plotters rendering of the spread chart.
//!
//! The same drawing routine backs the TUI widget (via
//! `plotters-ratatui-backend`) and the SVG export, so the two never drift apart.
//! All series and bounds are computed up front in `SpreadChartData`; drawing
//! only maps them to primitives.

use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{AppError, ErrorKind};
use crate::plot::ascii::pad_range;
use crate::signal::Analysis;

/// Chart series in plot coordinates (x = decimal year, y = spread in pp).
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadChartData {
    pub spread: Vec<(f64, f64)>,
    pub inversion_bands: Vec<(f64, f64)>,
    pub recession_bands: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl SpreadChartData {
    /// `None` when there is nothing to plot.
    pub fn from_analysis(analysis: &Analysis) -> Option<Self> {
        let first = analysis.rows.first()?;
        let last = analysis.rows.last()?;

        let spread: Vec<(f64, f64)> = analysis
            .rows
            .iter()
            .map(|r| (decimal_year(r.date), r.spread))
            .collect();

        let inversion_bands = analysis
            .intervals
            .iter()
            .map(|iv| (decimal_year(iv.start), decimal_year(iv.end)))
            .collect();
        let recession_bands = analysis
            .recession_bands
            .iter()
            .map(|b| (decimal_year(b.start), decimal_year(b.end)))
            .collect();

        let mut x0 = decimal_year(first.date);
        let mut x1 = decimal_year(last.date);
        if x1 - x0 < 1e-6 {
            x0 -= 0.5;
            x1 += 0.5;
        }

        let (lo, hi) = spread
            .iter()
            .map(|&(_, y)| y)
            .filter(|y| y.is_finite())
            .fold((0.0_f64, 0.0_f64), |(lo, hi), y| (lo.min(y), hi.max(y)));
        let (y0, y1) = pad_range(lo, hi, 0.05);

        Some(Self {
            spread,
            inversion_bands,
            recession_bands,
            x_bounds: [x0, x1],
            y_bounds: [y0, y1],
        })
    }
}

/// Year plus the elapsed fraction of that year.
pub fn decimal_year(d: NaiveDate) -> f64 {
    let days_in_year = if d.leap_year() { 366.0 } else { 365.0 };
    d.year() as f64 + d.ordinal0() as f64 / days_in_year
}

/// Colors and sizes for one rendering target.
#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub title: Option<&'static str>,
    pub foreground: RGBColor,
    pub line: RGBColor,
    pub inversion: RGBColor,
    pub recession: RGBColor,
    pub band_opacity: f64,
    pub label_size: u32,
    pub margin: u32,
    pub x_label_area: u32,
    pub y_label_area: u32,
}

impl ChartStyle {
    /// High-contrast palette for terminal cells.
    pub fn terminal() -> Self {
        Self {
            title: None,
            foreground: WHITE,
            line: RGBColor(0, 255, 255),
            inversion: RGBColor(255, 165, 0),
            recession: RGBColor(128, 128, 128),
            band_opacity: 1.0,
            label_size: 10,
            margin: 1,
            x_label_area: 3,
            y_label_area: 6,
        }
    }

    /// Light background, translucent bands.
    pub fn document() -> Self {
        Self {
            title: Some("10y - 2y spread with inversions and NBER recessions"),
            foreground: BLACK,
            line: RGBColor(31, 119, 180),
            inversion: RGBColor(255, 165, 0),
            recession: RGBColor(128, 128, 128),
            band_opacity: 0.15,
            label_size: 14,
            margin: 10,
            x_label_area: 40,
            y_label_area: 60,
        }
    }
}

/// Draw bands, zero line and spread onto any plotters drawing area.
pub fn draw_spread_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &SpreadChartData,
    style: &ChartStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let [x0, x1] = data.x_bounds;
    let [y0, y1] = data.y_bounds;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(style.margin)
        .set_label_area_size(LabelAreaPosition::Left, style.y_label_area)
        .set_label_area_size(LabelAreaPosition::Bottom, style.x_label_area);
    if let Some(title) = style.title {
        builder.caption(title, ("sans-serif", style.label_size + 4).into_font().color(&style.foreground));
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("Year")
        .y_desc("Spread (percentage points)")
        .x_labels(6)
        .y_labels(5)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.1}"))
        .label_style(("sans-serif", style.label_size).into_font().color(&style.foreground))
        .axis_style(&style.foreground)
        .bold_line_style(&style.foreground)
        .draw()?;

    let recession_fill = style.recession.mix(style.band_opacity).filled();
    chart.draw_series(
        data.recession_bands
            .iter()
            .map(|&(a, b)| Rectangle::new([(a, y0), (b, y1)], recession_fill)),
    )?;

    let inversion_fill = style.inversion.mix(style.band_opacity).filled();
    chart.draw_series(
        data.inversion_bands
            .iter()
            .map(|&(a, b)| Rectangle::new([(a, y0), (b, y1)], inversion_fill)),
    )?;

    chart.draw_series(LineSeries::new([(x0, 0.0), (x1, 0.0)], &style.foreground))?;
    chart.draw_series(LineSeries::new(data.spread.iter().copied(), &style.line))?;

    Ok(())
}

/// Render the chart as an SVG document.
pub fn render_svg(data: &SpreadChartData, size: (u32, u32)) -> Result<String, AppError> {
    let chart_err = |e: String| AppError::new(ErrorKind::Export, format!("Failed to render SVG chart: {e}"));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| chart_err(e.to_string()))?;
        draw_spread_chart(&root, data, &ChartStyle::document()).map_err(|e| chart_err(e.to_string()))?;
        root.present().map_err(|e| chart_err(e.to_string()))?;
    }
    Ok(svg)
}
