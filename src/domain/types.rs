//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during detection and linking
//! - exported to the workbook / CSV tables
//! - constructed directly in tests without touching the filesystem

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lookback window (calendar months) between a dis-inversion and a recession onset.
pub const HORIZON_MONTHS: u32 = 24;

/// The three FRED series the analysis consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesCode {
    /// 10-year treasury constant maturity yield (percent).
    Dgs10,
    /// 2-year treasury constant maturity yield (percent).
    Dgs2,
    /// NBER-based recession indicator (0/1).
    Usrec,
}

impl SeriesCode {
    pub const ALL: [SeriesCode; 3] = [SeriesCode::Dgs10, SeriesCode::Dgs2, SeriesCode::Usrec];

    /// FRED series id, also the canonical metric column name.
    pub fn code(self) -> &'static str {
        match self {
            SeriesCode::Dgs10 => "DGS10",
            SeriesCode::Dgs2 => "DGS2",
            SeriesCode::Usrec => "USREC",
        }
    }

    /// Accepted metric column names, in priority order.
    ///
    /// These are compared case-insensitively and exactly; substring matching on
    /// `code()` is only the second resolution step (see `io::ingest`).
    pub fn column_candidates(self) -> &'static [&'static str] {
        match self {
            SeriesCode::Dgs10 => &["DGS10"],
            SeriesCode::Dgs2 => &["DGS2"],
            SeriesCode::Usrec => &["USREC", "USRECD", "USRECM"],
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            SeriesCode::Dgs10 => "DGS10.csv",
            SeriesCode::Dgs2 => "DGS2.csv",
            SeriesCode::Usrec => "USREC.csv",
        }
    }

    pub fn is_indicator(self) -> bool {
        matches!(self, SeriesCode::Usrec)
    }
}

impl std::fmt::Display for SeriesCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One source metric as an ordered `(date, value)` sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedSeries {
    pub code: SeriesCode,
    pub points: Vec<(NaiveDate, f64)>,
}

impl ObservedSeries {
    /// Build a series, sorting ascending by date.
    ///
    /// Duplicate dates keep their first occurrence (in input order).
    pub fn new(code: SeriesCode, mut points: Vec<(NaiveDate, f64)>) -> Self {
        let before = points.len();
        // Stable sort so "first occurrence" means first in the source file.
        points.sort_by_key(|(d, _)| *d);
        points.dedup_by_key(|(d, _)| *d);
        let dropped = before - points.len();
        if dropped > 0 {
            tracing::warn!(series = code.code(), dropped, "duplicate dates in series; kept first occurrence");
        }
        Self { code, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One date present in all three input series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub yield10: f64,
    pub yield2: f64,
    pub recession: bool,
}

/// An aligned row with the derived spread columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadRow {
    pub date: NaiveDate,
    pub yield10: f64,
    pub yield2: f64,
    pub recession: bool,
    /// `yield10 - yield2`, percentage points.
    pub spread: f64,
    pub inverted: bool,
    /// Previous row's `inverted` (false for the first row).
    pub inverted_prev: bool,
}

/// A contiguous run of inverted days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InversionInterval {
    /// First inverted date of the run.
    pub start: NaiveDate,
    /// First non-inverted date after the run (the dis-inversion date), or the
    /// final observed date when `open_at_end` is set.
    pub end: NaiveDate,
    /// The data ended while still inverted; `end` is the data boundary, not a
    /// resolution.
    pub open_at_end: bool,
}

/// Outcome of searching for a recession onset after one dis-inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub inversion_end: NaiveDate,
    pub found_recession: bool,
    pub recession_start: Option<NaiveDate>,
    pub days_to_recession: Option<i64>,
}

/// Hit/miss aggregate over all link records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub total: usize,
    pub true_signals: usize,
    pub false_signals: usize,
    /// `None` when `total == 0` (undefined).
    pub hit_rate: Option<f64>,
}

/// A shaded recession span for charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecessionBand {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults). Defaults match the fixed
/// file names FRED uses for CSV downloads.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub dgs10_path: PathBuf,
    pub dgs2_path: PathBuf,
    pub usrec_path: PathBuf,
    pub output_path: PathBuf,

    /// Also write each table as `<sheet>.csv` into this directory.
    pub csv_dir: Option<PathBuf>,
    /// Persist the chart as SVG.
    pub chart_svg: Option<PathBuf>,

    /// How many inversion rows the terminal preview shows.
    pub preview: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

pub const DEFAULT_OUTPUT_FILE: &str = "yieldcurve_analysis_complete.xlsx";

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dgs10_path: PathBuf::from(SeriesCode::Dgs10.default_file_name()),
            dgs2_path: PathBuf::from(SeriesCode::Dgs2.default_file_name()),
            usrec_path: PathBuf::from(SeriesCode::Usrec.default_file_name()),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            csv_dir: None,
            chart_svg: None,
            preview: 10,
            plot: true,
            plot_width: 100,
            plot_height: 25,
        }
    }
}

impl AnalysisConfig {
    pub fn input_path(&self, code: SeriesCode) -> &PathBuf {
        match code {
            SeriesCode::Dgs10 => &self.dgs10_path,
            SeriesCode::Dgs2 => &self.dgs2_path,
            SeriesCode::Usrec => &self.usrec_path,
        }
    }
}

/// Settings for `yc fetch`.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory the three CSV files are written into.
    pub dir: PathBuf,
    pub observation_start: Option<NaiveDate>,
}
