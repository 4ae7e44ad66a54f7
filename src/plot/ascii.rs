//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements, back to front:
//! - recession bands: `▒`
//! - inversion bands: `░`
//! - zero line: `-`
//! - spread line: `*`

use chrono::NaiveDate;

use crate::domain::{InversionInterval, RecessionBand, SpreadRow};

const RECESSION: char = '▒';
const INVERSION: char = '░';
const ZERO: char = '-';
const SPREAD: char = '*';

/// Render the spread chart as text. `width`/`height` are clamped to 10x5.
pub fn render_ascii_plot(
    rows: &[SpreadRow],
    intervals: &[InversionInterval],
    recessions: &[RecessionBand],
    width: usize,
    height: usize,
) -> String {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return "Plot: no aligned observations\n".to_string();
    };

    let width = width.max(10);
    let height = height.max(5);

    let origin = first.date;
    let x_of = |d: NaiveDate| (d - origin).num_days() as f64;
    let t_min = 0.0;
    let t_max = x_of(last.date).max(1.0);

    let (y_min, y_max) = spread_range(rows);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Background bands, column by column.
    for col in 0..width {
        let t = t_min + col as f64 / (width as f64 - 1.0) * (t_max - t_min);
        let in_band = |start: NaiveDate, end: NaiveDate| t >= x_of(start) && t <= x_of(end);
        let ch = if recessions.iter().any(|b| in_band(b.start, b.end)) {
            Some(RECESSION)
        } else if intervals.iter().any(|iv| in_band(iv.start, iv.end)) {
            Some(INVERSION)
        } else {
            None
        };
        if let Some(ch) = ch {
            for row in grid.iter_mut() {
                row[col] = ch;
            }
        }
    }

    let zero_row = map_y(0.0, y_min, y_max, height);
    for cell in grid[zero_row].iter_mut() {
        *cell = ZERO;
    }

    let mut prev = None;
    for r in rows {
        let x = map_x(x_of(r.date), t_min, t_max, width);
        let y = map_y(r.spread, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, SPREAD),
            None => grid[y][x] = SPREAD,
        }
        prev = Some((x, y));
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} .. {} | spread=[{y_min:.2}, {y_max:.2}] pp\n",
        first.date, last.date
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&format!(
        "Legend: {SPREAD} spread  {ZERO} zero  {INVERSION} inversion  {RECESSION} recession\n"
    ));

    out
}

/// Spread min/max, always including zero so the zero line is on the chart.
fn spread_range(rows: &[SpreadRow]) -> (f64, f64) {
    rows.iter()
        .map(|r| r.spread)
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-3);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
