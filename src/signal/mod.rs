//! Inversion detection, recession linking and hit-rate statistics.
//!
//! Everything here works on in-memory series; file handling lives in `io`.

pub mod inversion;
pub mod recession;
pub mod stats;

use chrono::NaiveDate;

use crate::domain::{AlignedRow, InversionInterval, LinkRecord, ObservedSeries, RecessionBand, SignalStats, SpreadRow};
use crate::error::AppError;

pub use inversion::{compute_spread, detect_inversions, pair_intervals};
pub use recession::{horizon_end, link_all, link_recession, recession_bands, recession_onsets};
pub use stats::summarize;

/// All derived outputs of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub rows: Vec<SpreadRow>,
    pub intervals: Vec<InversionInterval>,
    pub onsets: Vec<NaiveDate>,
    pub links: Vec<LinkRecord>,
    pub stats: SignalStats,
    pub recession_bands: Vec<RecessionBand>,
}

/// Run detection → linking → summary over aligned rows.
///
/// Onsets come from the full recession series, not only the aligned dates.
/// Empty `rows` is a valid zero-result run.
pub fn analyze(rows: &[AlignedRow], usrec: &ObservedSeries) -> Result<Analysis, AppError> {
    if rows.is_empty() {
        tracing::warn!("no common dates across the three series; producing an empty analysis");
    }

    let rows = compute_spread(rows);
    let intervals = detect_inversions(&rows)?;
    let onsets = recession_onsets(usrec);
    let links = link_all(&intervals, &onsets);
    let stats = summarize(&links);
    let recession_bands = recession_bands(&rows);

    tracing::info!(
        onsets = onsets.len(),
        total = stats.total,
        true_signals = stats.true_signals,
        "linked dis-inversions to recession onsets"
    );

    Ok(Analysis {
        rows,
        intervals,
        onsets,
        links,
        stats,
        recession_bands,
    })
}
