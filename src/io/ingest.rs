//! CSV ingest and normalization.
//!
//! This module is responsible for turning a FRED-style CSV download into a clean
//! `ObservedSeries`, and for aligning the three series on a common date key.
//!
//! Design goals:
//! - **Strict schema**: a date column plus exactly one metric column, resolved
//!   from an explicit candidate list (clear errors, exit code 2)
//! - **Fail fast** on unparseable dates or numbers; only FRED's "no data"
//!   placeholders are skipped
//! - **Deterministic behavior**: column choice never depends on header order
//!   beyond the documented rules

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{AlignedRow, ObservedSeries, SeriesCode};
use crate::error::{AppError, ErrorKind};

/// Accepted date column labels, in priority order (case-insensitive).
///
/// Older FRED downloads use `DATE`; newer ones use `observation_date`.
pub const DATE_CANDIDATES: [&str; 2] = ["DATE", "observation_date"];

/// Values FRED (and spreadsheet tools) use for "no observation on this date".
const MISSING_MARKERS: [&str; 4] = [".", "nan", "na", "#n/a"];

/// Column indices chosen for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub date: usize,
    pub value: usize,
    /// Header of the chosen metric column, as written in the file.
    pub value_name: String,
}

/// Open and parse one series file.
pub fn load_series(path: &Path, code: SeriesCode) -> Result<ObservedSeries, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            ErrorKind::FileNotFound,
            format!("Failed to open {code} input '{}': {e}", path.display()),
        )
    })?;

    let series = read_series(file, code, &path.display().to_string())?;
    tracing::info!(series = code.code(), path = %path.display(), observations = series.len(), "loaded series");
    Ok(series)
}

/// Parse one series from any CSV source. `source` is only used in messages.
pub fn read_series<R: Read>(rdr: R, code: SeriesCode, source: &str) -> Result<ObservedSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(ErrorKind::Parse, format!("Failed to read CSV headers from '{source}': {e}")))?
        .clone();

    let columns = resolve_columns(&headers, code)
        .map_err(|msg| AppError::new(ErrorKind::Schema, format!("{source}: {msg}")))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;

        let record = result
            .map_err(|e| AppError::new(ErrorKind::Parse, format!("{source}:{line}: CSV parse error: {e}")))?;

        let raw_date = record.get(columns.date).unwrap_or("");
        let date = parse_date(raw_date)
            .map_err(|msg| AppError::new(ErrorKind::Parse, format!("{source}:{line}: {msg}")))?;

        let raw_value = record.get(columns.value).unwrap_or("");
        match parse_value(raw_value, code) {
            Ok(Some(v)) => points.push((date, v)),
            Ok(None) => skipped += 1,
            Err(msg) => {
                return Err(AppError::new(
                    ErrorKind::Parse,
                    format!("{source}:{line}: {msg} (column `{}`)", columns.value_name),
                ));
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(series = code.code(), skipped, "skipped rows without an observation");
    }

    Ok(ObservedSeries::new(code, points))
}

/// Resolve the date column and the metric column for `code`.
///
/// Metric column resolution:
/// 1. first exact (case-insensitive) match from `code.column_candidates()`
/// 2. else the single column whose name contains `code.code()` as a token;
///    several such columns are ambiguous and rejected
/// 3. else the only non-date column, if there is exactly one
///
/// Steps 2 and 3 never accept a column that names another series (`DGS10`
/// offered for DGS2, or a longer id such as `DGS20`); that is a schema error.
pub fn resolve_columns(headers: &StringRecord, code: SeriesCode) -> Result<ResolvedColumns, String> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

    let date = DATE_CANDIDATES
        .iter()
        .find_map(|cand| names.iter().position(|n| n.eq_ignore_ascii_case(cand)))
        .ok_or_else(|| {
            format!(
                "Missing date column (expected one of: {}; found: {})",
                DATE_CANDIDATES.join(", "),
                names.join(", ")
            )
        })?;

    let value = resolve_metric_column(&names, date, code)?;

    Ok(ResolvedColumns {
        date,
        value,
        value_name: names[value].clone(),
    })
}

fn resolve_metric_column(names: &[String], date: usize, code: SeriesCode) -> Result<usize, String> {
    let is_metric = |i: usize| i != date;

    for cand in code.column_candidates() {
        if let Some(i) = (0..names.len()).find(|&i| is_metric(i) && names[i].eq_ignore_ascii_case(cand)) {
            return Ok(i);
        }
    }

    let needle = code.code();
    let containing: Vec<usize> = (0..names.len())
        .filter(|&i| is_metric(i) && contains_code(&names[i], needle) && other_series(&names[i], code).is_none())
        .collect();
    match containing.as_slice() {
        [i] => return Ok(*i),
        [] => {}
        many => {
            let listed: Vec<&str> = many.iter().map(|&i| names[i].as_str()).collect();
            return Err(format!(
                "Ambiguous `{needle}` column: {} all match; rename the intended column to `{needle}`",
                listed.join(", ")
            ));
        }
    }

    let others: Vec<usize> = (0..names.len()).filter(|&i| is_metric(i)).collect();
    if let [only] = others.as_slice() {
        let name = &names[*only];
        if let Some(held) = other_series(name, code) {
            return Err(format!(
                "Column `{name}` holds {held}, not `{needle}`; check which file was passed for {needle}"
            ));
        }
        tracing::warn!(series = needle, column = %name, "no `{needle}` column; using the only value column");
        return Ok(*only);
    }

    Err(format!(
        "Missing `{needle}` column (accepted: {}; found: {})",
        code.column_candidates().join(", "),
        names.join(", ")
    ))
}

/// `name` contains `code` as a whole token (`DGS10_2024` yes, `DGS20` no for `DGS2`).
fn contains_code(name: &str, code: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    upper.match_indices(code).any(|(i, m)| {
        let before = upper[..i].chars().next_back();
        let after = upper[i + m.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric()) && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// Describe the series a column names when it is not `code`'s.
///
/// Catches the other inputs' columns (`DGS10` offered as DGS2) and longer FRED
/// ids that merely start with the code (`DGS20` offered as DGS2).
fn other_series(name: &str, code: SeriesCode) -> Option<String> {
    for other in SeriesCode::ALL.into_iter().filter(|&c| c != code) {
        let exact = other.column_candidates().iter().any(|c| name.eq_ignore_ascii_case(c));
        if exact || contains_code(name, other.code()) {
            return Some(format!("the {other} series"));
        }
    }

    let upper = name.to_ascii_uppercase();
    if upper.contains(code.code()) && !contains_code(name, code.code()) {
        return Some(format!("a different FRED series (`{name}`)"));
    }
    None
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, the date column goes unrecognized.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // FRED writes ISO dates; the other formats cover files re-saved by
    // spreadsheet tools.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY, DD-MM-YYYY."
    ))
}

/// `Ok(None)` means "no observation"; the row is skipped.
fn parse_value(raw: &str, code: SeriesCode) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }

    let v = trimmed
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{trimmed}'"))?;
    if !v.is_finite() {
        return Err(format!("Non-finite number '{trimmed}'"));
    }

    if code.is_indicator() && v != 0.0 && v != 1.0 {
        return Err(format!("Recession indicator must be 0 or 1, got '{trimmed}'"));
    }

    Ok(Some(v))
}

/// Inner-join the three series on date, ascending.
///
/// Dates missing from any one series are dropped: only dates with full
/// coverage are analyzed.
pub fn align(dgs10: &ObservedSeries, dgs2: &ObservedSeries, usrec: &ObservedSeries) -> Vec<AlignedRow> {
    let y2: HashMap<NaiveDate, f64> = dgs2.points.iter().copied().collect();
    let rec: HashMap<NaiveDate, f64> = usrec.points.iter().copied().collect();

    let mut rows: Vec<AlignedRow> = dgs10
        .points
        .iter()
        .filter_map(|&(date, yield10)| {
            let yield2 = *y2.get(&date)?;
            let flag = *rec.get(&date)?;
            Some(AlignedRow {
                date,
                yield10,
                yield2,
                recession: flag != 0.0,
            })
        })
        .collect();

    // `ObservedSeries` is already sorted; keep the invariant explicit anyway.
    rows.sort_by_key(|r| r.date);

    tracing::info!(
        rows = rows.len(),
        dgs10 = dgs10.len(),
        dgs2 = dgs2.len(),
        usrec = usrec.len(),
        "aligned series on common dates"
    );

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn headers(cols: &[&str]) -> StringRecord {
        StringRecord::from(cols.to_vec())
    }

    #[test]
    fn accepts_observation_date_label() {
        let csv = "observation_date,DGS10\n2024-01-02,3.95\n2024-01-03,3.91\n";
        let s = read_series(csv.as_bytes(), SeriesCode::Dgs10, "mem").unwrap();
        assert_eq!(s.points, vec![(d(2024, 1, 2), 3.95), (d(2024, 1, 3), 3.91)]);
    }

    #[test]
    fn strips_bom_from_first_header() {
        let csv = "\u{feff}DATE,DGS2\n2024-01-02,4.33\n";
        let s = read_series(csv.as_bytes(), SeriesCode::Dgs2, "mem").unwrap();
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn exact_candidate_beats_substring_match() {
        let cols = resolve_columns(&headers(&["DATE", "DGS20", "DGS2"]), SeriesCode::Dgs2).unwrap();
        assert_eq!(cols.value, 2);
        assert_eq!(cols.value_name, "DGS2");
    }

    #[test]
    fn single_substring_match_is_selected() {
        let cols = resolve_columns(&headers(&["DATE", "DGS10_20240101"]), SeriesCode::Dgs10).unwrap();
        assert_eq!(cols.value, 1);
    }

    #[test]
    fn several_substring_matches_are_rejected() {
        let err = resolve_columns(&headers(&["DATE", "DGS10_A", "DGS10_B"]), SeriesCode::Dgs10).unwrap_err();
        assert!(err.contains("Ambiguous"), "{err}");
    }

    #[test]
    fn dgs10_column_is_not_accepted_as_dgs2() {
        let csv = "observation_date,DGS10\n2024-01-02,3.95\n";
        let err = read_series(csv.as_bytes(), SeriesCode::Dgs2, "DGS10.csv").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("DGS10"), "{err}");
    }

    #[test]
    fn dgs20_is_not_a_dgs2_match() {
        let err = resolve_columns(&headers(&["DATE", "DGS20"]), SeriesCode::Dgs2).unwrap_err();
        assert!(err.contains("DGS20"), "{err}");

        let csv = "DATE,DGS20\n2024-01-02,4.6\n";
        let err = read_series(csv.as_bytes(), SeriesCode::Dgs2, "mem").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn yield_column_is_not_accepted_as_recession_flag() {
        let err = resolve_columns(&headers(&["DATE", "DGS2"]), SeriesCode::Usrec).unwrap_err();
        assert!(err.contains("DGS2"), "{err}");
    }

    #[test]
    fn other_series_token_does_not_count_as_a_substring_match() {
        let cols = resolve_columns(&headers(&["DATE", "DGS2_DGS10", "DGS2_close"]), SeriesCode::Dgs2).unwrap();
        assert_eq!(cols.value_name, "DGS2_close");
    }

    #[test]
    fn lone_value_column_is_the_fallback() {
        let cols = resolve_columns(&headers(&["DATE", "value"]), SeriesCode::Usrec).unwrap();
        assert_eq!(cols.value, 1);
    }

    #[test]
    fn missing_metric_column_is_a_schema_error() {
        let csv = "DATE,foo,bar\n2024-01-02,1,2\n";
        let err = read_series(csv.as_bytes(), SeriesCode::Dgs10, "mem").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn missing_date_column_is_a_schema_error() {
        let csv = "when,DGS10\n2024-01-02,1\n";
        let err = read_series(csv.as_bytes(), SeriesCode::Dgs10, "mem").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn unparseable_date_is_a_parse_error() {
        let csv = "DATE,DGS10\nnot-a-date,3.9\n";
        let err = read_series(csv.as_bytes(), SeriesCode::Dgs10, "mem").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("mem:2"), "{err}");
    }

    #[test]
    fn unparseable_number_is_a_parse_error() {
        let csv = "DATE,DGS10\n2024-01-02,abc\n";
        let err = read_series(csv.as_bytes(), SeriesCode::Dgs10, "mem").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn fred_missing_markers_are_skipped() {
        let csv = "DATE,DGS10\n2024-01-01,.\n2024-01-02,\n2024-01-03,3.9\n";
        let s = read_series(csv.as_bytes(), SeriesCode::Dgs10, "mem").unwrap();
        assert_eq!(s.points, vec![(d(2024, 1, 3), 3.9)]);
    }

    #[test]
    fn recession_flag_must_be_binary() {
        let ok = "DATE,USREC\n2020-03-01,1.0\n2020-01-01,0\n";
        let s = read_series(ok.as_bytes(), SeriesCode::Usrec, "mem").unwrap();
        assert_eq!(s.points, vec![(d(2020, 1, 1), 0.0), (d(2020, 3, 1), 1.0)]);

        let bad = "DATE,USREC\n2020-03-01,2\n";
        let err = read_series(bad.as_bytes(), SeriesCode::Usrec, "mem").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn missing_file_is_reported_as_file_not_found() {
        let err = load_series(Path::new("definitely/not/here.csv"), SeriesCode::Dgs10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn align_is_an_ascending_inner_join() {
        let dgs10 = ObservedSeries::new(
            SeriesCode::Dgs10,
            vec![(d(2024, 1, 3), 4.0), (d(2024, 1, 1), 4.2), (d(2024, 1, 2), 4.1)],
        );
        let dgs2 = ObservedSeries::new(SeriesCode::Dgs2, vec![(d(2024, 1, 1), 4.5), (d(2024, 1, 3), 4.4)]);
        let usrec = ObservedSeries::new(
            SeriesCode::Usrec,
            vec![(d(2024, 1, 1), 0.0), (d(2024, 1, 2), 0.0), (d(2024, 1, 3), 1.0)],
        );

        let rows = align(&dgs10, &dgs2, &usrec);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2024, 1, 1));
        assert_eq!(rows[1].date, d(2024, 1, 3));
        assert!(!rows[0].recession);
        assert!(rows[1].recession);
    }

    #[test]
    fn align_with_no_common_dates_is_empty() {
        let dgs10 = ObservedSeries::new(SeriesCode::Dgs10, vec![(d(2024, 1, 1), 4.0)]);
        let dgs2 = ObservedSeries::new(SeriesCode::Dgs2, vec![(d(2024, 1, 2), 4.0)]);
        let usrec = ObservedSeries::new(SeriesCode::Usrec, vec![(d(2024, 1, 3), 0.0)]);
        assert!(align(&dgs10, &dgs2, &usrec).is_empty());
    }

    #[test]
    fn duplicate_dates_keep_first_occurrence() {
        let s = ObservedSeries::new(SeriesCode::Dgs10, vec![(d(2024, 1, 1), 1.0), (d(2024, 1, 1), 2.0)]);
        assert_eq!(s.points, vec![(d(2024, 1, 1), 1.0)]);
    }
}
