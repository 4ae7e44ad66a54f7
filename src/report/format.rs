//! Formatted terminal output.
//!
//! Formatting lives in one place so output changes stay localized and the
//! layouts can be pinned by snapshot-style tests.

use std::path::Path;

use crate::domain::{HORIZON_MONTHS, InversionInterval, LinkRecord, SignalStats};
use crate::signal::Analysis;

/// Run header: observation window and interval count.
pub fn format_run_summary(analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str("=== yc - Yield Curve Inversion -> Recession Signal ===\n");
    match (analysis.rows.first(), analysis.rows.last()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!(
                "Observations: n={} | {} .. {}\n",
                analysis.rows.len(),
                first.date,
                last.date
            ));
        }
        _ => out.push_str("Observations: n=0 (no common dates across the three series)\n"),
    }
    let inverted_days = analysis.rows.iter().filter(|r| r.inverted).count();
    out.push_str(&format!(
        "Inversions: {} intervals | {inverted_days} inverted days | {} recession onsets\n",
        analysis.intervals.len(),
        analysis.onsets.len()
    ));

    out
}

/// Signal table: totals, hits, misses and hit rate.
pub fn format_signal_summary(stats: &SignalStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Signal analysis ({HORIZON_MONTHS}-month horizon):\n"));
    out.push_str(&format!("{:<22} {:>8}\n", "total_dis_inversions", stats.total));
    out.push_str(&format!("{:<22} {:>8}\n", "true_signals", stats.true_signals));
    out.push_str(&format!("{:<22} {:>8}\n", "false_signals", stats.false_signals));
    out.push_str(&format!("{:<22} {:>8}\n", "hit_rate", fmt_rate(stats.hit_rate)));
    out
}

/// First `limit` inversion intervals.
pub fn format_inversion_preview(intervals: &[InversionInterval], limit: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Inversions (first {} of {}):\n",
        limit.min(intervals.len()),
        intervals.len()
    ));
    push_row(&mut out, format!("{:<12} {:<12} {:<4}", "start", "end", "open"));
    push_row(&mut out, format!("{:-<12} {:-<12} {:-<4}", "", "", ""));

    for iv in intervals.iter().take(limit) {
        push_row(
            &mut out,
            format!(
                "{:<12} {:<12} {:<4}",
                iv.start.to_string(),
                iv.end.to_string(),
                if iv.open_at_end { "yes" } else { "" }
            ),
        );
    }
    out
}

/// Every dis-inversion with its linked recession onset, if any.
pub fn format_links(links: &[LinkRecord]) -> String {
    let mut out = String::new();
    out.push_str("Dis-inversion -> recession links:\n");
    if links.is_empty() {
        out.push_str("(none)\n");
        return out;
    }

    push_row(
        &mut out,
        format!("{:<12} {:<6} {:<12} {:>6}", "dis_inv", "found", "recession", "days"),
    );
    push_row(&mut out, format!("{:-<12} {:-<6} {:-<12} {:->6}", "", "", "", ""));
    for l in links {
        let recession = l.recession_start.map(|d| d.to_string()).unwrap_or_default();
        let days = l.days_to_recession.map(|n| n.to_string()).unwrap_or_default();
        push_row(
            &mut out,
            format!(
                "{:<12} {:<6} {:<12} {:>6}",
                l.inversion_end.to_string(),
                if l.found_recession { "yes" } else { "no" },
                recession,
                days
            ),
        );
    }
    out
}

pub fn format_saved(path: &Path) -> String {
    format!("Saved: {}", path.display())
}

fn fmt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}%", r * 100.0),
        None => "n/a".to_string(),
    }
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn signal_summary_layout() {
        let stats = SignalStats {
            total: 4,
            true_signals: 3,
            false_signals: 1,
            hit_rate: Some(0.75),
        };
        let expected = concat!(
            "Signal analysis (24-month horizon):\n",
            "total_dis_inversions          4\n",
            "true_signals                  3\n",
            "false_signals                 1\n",
            "hit_rate                  75.0%\n",
        );
        assert_eq!(format_signal_summary(&stats), expected);
    }

    #[test]
    fn undefined_hit_rate_prints_na() {
        let stats = SignalStats {
            total: 0,
            true_signals: 0,
            false_signals: 0,
            hit_rate: None,
        };
        assert!(format_signal_summary(&stats).contains("hit_rate                    n/a\n"));
    }

    #[test]
    fn inversion_preview_respects_limit() {
        let intervals = vec![
            InversionInterval { start: d(2019, 5, 23), end: d(2019, 10, 11), open_at_end: false },
            InversionInterval { start: d(2022, 7, 5), end: d(2024, 9, 6), open_at_end: false },
            InversionInterval { start: d(2025, 1, 2), end: d(2025, 1, 6), open_at_end: true },
        ];
        let txt = format_inversion_preview(&intervals, 2);
        let expected = concat!(
            "Inversions (first 2 of 3):\n",
            "start        end          open\n",
            "------------ ------------ ----\n",
            "2019-05-23   2019-10-11\n",
            "2022-07-05   2024-09-06\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn links_show_days_and_blank_misses() {
        let links = vec![
            LinkRecord {
                inversion_end: d(2022, 2, 11),
                found_recession: true,
                recession_start: Some(d(2023, 6, 1)),
                days_to_recession: Some(475),
            },
            LinkRecord {
                inversion_end: d(2024, 9, 6),
                found_recession: false,
                recession_start: None,
                days_to_recession: None,
            },
        ];
        let txt = format_links(&links);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[3], "2022-02-11   yes    2023-06-01      475");
        assert_eq!(lines[4], "2024-09-06   no");
    }

    #[test]
    fn empty_links_say_none() {
        assert_eq!(format_links(&[]), "Dis-inversion -> recession links:\n(none)\n");
    }
}
