//! Spread computation and inversion interval detection.

use chrono::NaiveDate;

use crate::domain::{AlignedRow, InversionInterval, SpreadRow};
use crate::error::{AppError, ErrorKind};

/// Derive `spread`, `inverted` and `inverted_prev` for each aligned row.
///
/// The state before the first row counts as "not inverted".
pub fn compute_spread(rows: &[AlignedRow]) -> Vec<SpreadRow> {
    let mut out = Vec::with_capacity(rows.len());
    let mut prev = false;
    for r in rows {
        let spread = r.yield10 - r.yield2;
        let inverted = spread < 0.0;
        out.push(SpreadRow {
            date: r.date,
            yield10: r.yield10,
            yield2: r.yield2,
            recession: r.recession,
            spread,
            inverted,
            inverted_prev: prev,
        });
        prev = inverted;
    }
    out
}

/// Collapse the inverted flags into contiguous intervals.
///
/// A start is an inverted row after a non-inverted one (or the very first row,
/// if it is inverted). An end is the first non-inverted row after an inverted
/// one. A run still active at the last row is closed at that row's date and
/// flagged `open_at_end`.
pub fn detect_inversions(rows: &[SpreadRow]) -> Result<Vec<InversionInterval>, AppError> {
    let Some(last) = rows.last() else {
        return Ok(Vec::new());
    };

    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for r in rows {
        if r.inverted && !r.inverted_prev {
            starts.push(r.date);
        } else if !r.inverted && r.inverted_prev {
            ends.push(r.date);
        }
    }

    let intervals = pair_intervals(&starts, &ends, last.date)?;
    tracing::info!(intervals = intervals.len(), "detected inversion intervals");
    Ok(intervals)
}

/// Pair starts with ends by position.
///
/// Requires strict alternation `start[i] < end[i] < start[i + 1]`, with at most
/// one trailing start left open (closed at `last_date`). Anything else is an
/// `Invariant` error rather than a silent mispairing.
pub fn pair_intervals(
    starts: &[NaiveDate],
    ends: &[NaiveDate],
    last_date: NaiveDate,
) -> Result<Vec<InversionInterval>, AppError> {
    let has_open_tail = match starts.len().checked_sub(ends.len()) {
        Some(0) => false,
        Some(1) => true,
        _ => {
            return Err(AppError::new(
                ErrorKind::Invariant,
                format!(
                    "Inversion starts/ends do not alternate: {} starts vs {} ends.",
                    starts.len(),
                    ends.len()
                ),
            ));
        }
    };

    let mut out = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let (end, open_at_end) = match ends.get(i) {
            Some(&end) => (end, false),
            None => (last_date, true),
        };

        let ordered = if open_at_end { start <= end } else { start < end };
        if !ordered {
            return Err(AppError::new(
                ErrorKind::Invariant,
                format!("Inversion interval #{} ends ({end}) before it starts ({start}).", i + 1),
            ));
        }
        if let Some(&next) = starts.get(i + 1) {
            if end >= next {
                return Err(AppError::new(
                    ErrorKind::Invariant,
                    format!("Inversion interval #{} (end {end}) overlaps the next start ({next}).", i + 1),
                ));
            }
        }

        out.push(InversionInterval {
            start,
            end,
            open_at_end,
        });
    }

    debug_assert_eq!(out.iter().filter(|iv| iv.open_at_end).count(), usize::from(has_open_tail));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Daily rows starting at `start`, one per spread value (yield2 fixed at 4.0).
    fn rows_from_spreads(start: NaiveDate, spreads: &[f64]) -> Vec<SpreadRow> {
        let aligned: Vec<AlignedRow> = spreads
            .iter()
            .enumerate()
            .map(|(i, &s)| AlignedRow {
                date: start + Duration::days(i as i64),
                yield10: 4.0 + s,
                yield2: 4.0,
                recession: false,
            })
            .collect();
        compute_spread(&aligned)
    }

    fn assert_interval_properties(rows: &[SpreadRow], intervals: &[InversionInterval]) {
        for w in intervals.windows(2) {
            assert!(w[0].end < w[1].start, "overlap: {:?}", w);
        }
        for iv in intervals {
            assert!(iv.start <= iv.end);
            for r in rows.iter().filter(|r| r.date >= iv.start && r.date < iv.end) {
                assert!(r.spread < 0.0, "row {} inside {:?} not inverted", r.date, iv);
            }
            if !iv.open_at_end {
                let at_end = rows.iter().find(|r| r.date == iv.end).unwrap();
                assert!(at_end.spread >= 0.0);
            }
        }
    }

    #[test]
    fn spread_flags_and_previous_state() {
        let rows = rows_from_spreads(d(2024, 1, 1), &[0.5, -0.1, 0.0]);
        assert!((rows[0].spread - 0.5).abs() < 1e-12);
        assert_eq!(
            rows.iter().map(|r| (r.inverted, r.inverted_prev)).collect::<Vec<_>>(),
            vec![(false, false), (true, false), (false, true)]
        );
    }

    #[test]
    fn zero_spread_is_not_inverted() {
        let rows = rows_from_spreads(d(2024, 1, 1), &[0.0, 0.0]);
        assert!(detect_inversions(&rows).unwrap().is_empty());
    }

    #[test]
    fn end_is_the_first_non_inverted_day() {
        let rows = rows_from_spreads(d(2024, 1, 1), &[0.2, -0.1, -0.3, 0.1, 0.2, -0.2, 0.4]);
        let ivs = detect_inversions(&rows).unwrap();
        assert_eq!(
            ivs,
            vec![
                InversionInterval { start: d(2024, 1, 2), end: d(2024, 1, 4), open_at_end: false },
                InversionInterval { start: d(2024, 1, 6), end: d(2024, 1, 7), open_at_end: false },
            ]
        );
        assert_interval_properties(&rows, &ivs);
    }

    #[test]
    fn still_inverted_at_end_is_closed_at_the_boundary() {
        let rows = rows_from_spreads(d(2024, 1, 1), &[0.2, -0.1, -0.3]);
        let ivs = detect_inversions(&rows).unwrap();
        assert_eq!(
            ivs,
            vec![InversionInterval { start: d(2024, 1, 2), end: d(2024, 1, 3), open_at_end: true }]
        );
        assert_interval_properties(&rows, &ivs);
    }

    #[test]
    fn first_row_inverted_registers_a_start_at_the_first_row() {
        let rows = rows_from_spreads(d(2024, 1, 1), &[-0.1, -0.2, 0.3]);
        let ivs = detect_inversions(&rows).unwrap();
        assert_eq!(ivs.len(), 1);
        assert_eq!(ivs[0].start, d(2024, 1, 1));
        assert_eq!(ivs[0].end, d(2024, 1, 3));
    }

    #[test]
    fn single_inverted_row_is_a_zero_length_open_interval() {
        let rows = rows_from_spreads(d(2024, 1, 1), &[-0.1]);
        let ivs = detect_inversions(&rows).unwrap();
        assert_eq!(
            ivs,
            vec![InversionInterval { start: d(2024, 1, 1), end: d(2024, 1, 1), open_at_end: true }]
        );
    }

    #[test]
    fn empty_input_gives_no_intervals() {
        assert!(detect_inversions(&[]).unwrap().is_empty());
    }

    #[test]
    fn alternating_pattern_satisfies_properties() {
        let spreads: Vec<f64> = (0..60).map(|i| if (i / 7) % 2 == 1 { -0.25 } else { 0.25 }).collect();
        let rows = rows_from_spreads(d(2023, 3, 1), &spreads);
        let ivs = detect_inversions(&rows).unwrap();
        assert_eq!(ivs.len(), 4);
        assert_interval_properties(&rows, &ivs);
    }

    #[test]
    fn pairing_rejects_too_many_ends() {
        let err = pair_intervals(&[d(2024, 1, 1)], &[d(2024, 1, 2), d(2024, 1, 3)], d(2024, 1, 5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn pairing_rejects_two_unclosed_starts() {
        let err = pair_intervals(&[d(2024, 1, 1), d(2024, 1, 3)], &[], d(2024, 1, 5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn pairing_rejects_consecutive_starts() {
        // Two starts before the first end: positional pairing would mispair.
        let starts = [d(2024, 1, 1), d(2024, 1, 2)];
        let ends = [d(2024, 1, 3), d(2024, 1, 4)];
        let err = pair_intervals(&starts, &ends, d(2024, 1, 5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }
}
