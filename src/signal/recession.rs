//! Recession onsets and dis-inversion → recession linking.

use chrono::{Months, NaiveDate};

use crate::domain::{HORIZON_MONTHS, InversionInterval, LinkRecord, ObservedSeries, RecessionBand, SpreadRow};

/// Dates where the recession flag goes 0 → 1.
///
/// The flag before the first observation counts as 0, so a series that starts
/// in recession yields an onset at its first date.
pub fn recession_onsets(usrec: &ObservedSeries) -> Vec<NaiveDate> {
    let mut prev = false;
    let mut out = Vec::new();
    for &(date, value) in &usrec.points {
        let flag = value != 0.0;
        if flag && !prev {
            out.push(date);
        }
        prev = flag;
    }
    out
}

/// Last date (inclusive) an onset may fall on to count for `from`.
///
/// Calendar-month offset; month ends clamp (2024-02-29 + 24 months = 2026-02-28).
pub fn horizon_end(from: NaiveDate) -> NaiveDate {
    from.checked_add_months(Months::new(HORIZON_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

/// Find the earliest onset `d` with `from < d <= horizon_end(from)`.
///
/// `onsets` must be sorted ascending.
pub fn link_recession(from: NaiveDate, onsets: &[NaiveDate]) -> LinkRecord {
    let limit = horizon_end(from);
    let idx = onsets.partition_point(|&d| d <= from);

    match onsets.get(idx).copied().filter(|&d| d <= limit) {
        Some(onset) => LinkRecord {
            inversion_end: from,
            found_recession: true,
            recession_start: Some(onset),
            days_to_recession: Some((onset - from).num_days()),
        },
        None => LinkRecord {
            inversion_end: from,
            found_recession: false,
            recession_start: None,
            days_to_recession: None,
        },
    }
}

/// One link record per interval, keyed on the interval's end date.
pub fn link_all(intervals: &[InversionInterval], onsets: &[NaiveDate]) -> Vec<LinkRecord> {
    intervals.iter().map(|iv| link_recession(iv.end, onsets)).collect()
}

/// Runs of consecutive recession rows, for shading.
///
/// A band starts at the first flagged row and ends at the first unflagged row
/// after it (or the last row, if the run reaches the end of the data).
pub fn recession_bands(rows: &[SpreadRow]) -> Vec<RecessionBand> {
    let mut out = Vec::new();
    let mut open: Option<NaiveDate> = None;
    for r in rows {
        match (open, r.recession) {
            (None, true) => open = Some(r.date),
            (Some(start), false) => {
                out.push(RecessionBand { start, end: r.date });
                open = None;
            }
            _ => {}
        }
    }
    if let (Some(start), Some(last)) = (open, rows.last()) {
        out.push(RecessionBand { start, end: last.date });
    }
    out
}
