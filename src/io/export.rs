//! Export the analysis tables.
//!
//! The five tables are built once (`build_tables`) and rendered either as sheets
//! of one `.xlsx` workbook or as flat CSV files. Writers render everything in
//! memory, stage it as temp files and rename only once every file is staged.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet, XlsxError};

use crate::domain::HORIZON_MONTHS;
use crate::error::{AppError, ErrorKind};
use crate::signal::Analysis;

pub const FED_CYCLE_NOTE: &str = "Provide Fed funds / policy rate timeseries to compute correlation with spread.";

/// One cell of an exported table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Date(NaiveDate),
    Number(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    Empty,
}

impl Cell {
    fn opt_date(d: Option<NaiveDate>) -> Self {
        d.map(Cell::Date).unwrap_or(Cell::Empty)
    }

    fn to_csv_field(&self) -> String {
        match self {
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Number(v) => v.to_string(),
            Cell::Int(v) => v.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }
}

/// A named table (sheet name / CSV file stem).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: &'static str,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    fn new(name: &'static str, headers: &[&str]) -> Self {
        Self {
            name,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

/// Build the five output tables, in sheet order.
pub fn build_tables(analysis: &Analysis) -> Vec<Table> {
    let mut full = Table::new(
        "full_data",
        &["DATE", "DGS10", "DGS2", "USREC", "spread", "inverted", "inverted_prev"],
    );
    for r in &analysis.rows {
        full.rows.push(vec![
            Cell::Date(r.date),
            Cell::Number(r.yield10),
            Cell::Number(r.yield2),
            Cell::Int(i64::from(r.recession)),
            Cell::Number(r.spread),
            Cell::Bool(r.inverted),
            Cell::Bool(r.inverted_prev),
        ]);
    }

    let mut inversions = Table::new("inversions", &["start", "end", "dis_inversion_date", "open_at_end"]);
    for iv in &analysis.intervals {
        inversions.rows.push(vec![
            Cell::Date(iv.start),
            Cell::Date(iv.end),
            Cell::Date(iv.end),
            Cell::Bool(iv.open_at_end),
        ]);
    }

    let within = format!("recession_within_{HORIZON_MONTHS}m");
    let mut links = Table::new(
        "recession_links",
        &["dis_inversion_date", within.as_str(), "recession_start_date", "days_to_recession"],
    );
    for l in &analysis.links {
        links.rows.push(vec![
            Cell::Date(l.inversion_end),
            Cell::Bool(l.found_recession),
            Cell::opt_date(l.recession_start),
            l.days_to_recession.map(Cell::Int).unwrap_or(Cell::Empty),
        ]);
    }

    let s = &analysis.stats;
    let mut signal = Table::new(
        "signal_analysis",
        &["total_dis_inversions", "true_signals", "false_signals", "hit_rate"],
    );
    signal.rows.push(vec![
        Cell::Int(s.total as i64),
        Cell::Int(s.true_signals as i64),
        Cell::Int(s.false_signals as i64),
        s.hit_rate.map(Cell::Number).unwrap_or(Cell::Empty),
    ]);

    let mut notes = Table::new("fed_cycle_notes", &["note"]);
    notes.rows.push(vec![Cell::Text(FED_CYCLE_NOTE.to_string())]);

    vec![full, inversions, links, signal, notes]
}

/// Render the workbook to bytes.
///
/// The document creation time is pinned so identical tables give identical bytes.
pub fn workbook_bytes(tables: &[Table]) -> Result<Vec<u8>, AppError> {
    render_workbook(tables).map_err(|e| AppError::new(ErrorKind::Export, format!("Failed to build workbook: {e}")))
}

fn render_workbook(tables: &[Table]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    let epoch = ExcelDateTime::from_ymd(2000, 1, 1)?;
    let properties = DocProperties::new()
        .set_title("Yield curve inversion analysis")
        .set_creation_datetime(&epoch);
    workbook.set_properties(&properties);

    let header = Format::new().set_bold();
    for table in tables {
        let sheet = workbook.add_worksheet();
        sheet.set_name(table.name)?;
        write_sheet(sheet, table, &header)?;
        sheet.autofit();
    }

    workbook.save_to_buffer()
}

fn write_sheet(sheet: &mut Worksheet, table: &Table, header: &Format) -> Result<(), XlsxError> {
    for (col, h) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, h, header)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Date(d) => {
                    sheet.write_string(r, c, d.format("%Y-%m-%d").to_string())?;
                }
                Cell::Number(v) => {
                    sheet.write_number(r, c, *v)?;
                }
                Cell::Int(v) => {
                    sheet.write_number(r, c, *v as f64)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Cell::Empty => {}
            }
        }
    }
    Ok(())
}

/// Render the workbook and stage it at `path`.
pub fn stage_workbook(staged: &mut StagedFiles, path: &Path, tables: &[Table]) -> Result<(), AppError> {
    let bytes = workbook_bytes(tables)?;
    staged.stage(path, &bytes)?;
    tracing::debug!(path = %path.display(), sheets = tables.len(), "staged workbook");
    Ok(())
}

/// Render each table and stage it as `<dir>/<name>.csv`. Returns the final paths.
pub fn stage_csv_tables(staged: &mut StagedFiles, dir: &Path, tables: &[Table]) -> Result<Vec<PathBuf>, AppError> {
    let mut rendered = Vec::with_capacity(tables.len());
    for table in tables {
        rendered.push((dir.join(format!("{}.csv", table.name)), render_csv(table)?));
    }

    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(ErrorKind::Export, format!("Failed to create '{}': {e}", dir.display())))?;

    let mut paths = Vec::with_capacity(rendered.len());
    for (path, bytes) in rendered {
        staged.stage(&path, &bytes)?;
        paths.push(path);
    }
    tracing::debug!(dir = %dir.display(), files = paths.len(), "staged CSV tables");
    Ok(paths)
}

fn render_csv(table: &Table) -> Result<Vec<u8>, AppError> {
    let err = |e: csv::Error| AppError::new(ErrorKind::Export, format!("Failed to write CSV table `{}`: {e}", table.name));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers).map_err(err)?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Cell::to_csv_field))
            .map_err(err)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::new(ErrorKind::Export, format!("Failed to flush CSV table `{}`: {e}", table.name)))
}

/// A set of files written to `<name>.tmp` first and renamed into place together.
///
/// Nothing is renamed until every file is staged. Dropping without `commit`
/// removes the temp files, so a failed stage leaves no output behind.
pub struct StagedFiles {
    kind: ErrorKind,
    staged: Vec<(PathBuf, PathBuf)>,
}

impl StagedFiles {
    /// `kind` classifies the I/O errors this set reports.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            staged: Vec::new(),
        }
    }

    pub fn stage(&mut self, path: &Path, bytes: &[u8]) -> Result<(), AppError> {
        let mut tmp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| AppError::new(self.kind, format!("Invalid output path '{}'", path.display())))?;
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        if let Err(e) = fs::write(&tmp, bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(AppError::new(self.kind, format!("Failed to write '{}': {e}", tmp.display())));
        }
        self.staged.push((tmp, path.to_path_buf()));
        Ok(())
    }

    /// Rename every staged file into place. Returns the final paths.
    pub fn commit(mut self) -> Result<Vec<PathBuf>, AppError> {
        let staged = std::mem::take(&mut self.staged);
        for (i, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, path) {
                for (rest, _) in &staged[i..] {
                    let _ = fs::remove_file(rest);
                }
                return Err(AppError::new(
                    self.kind,
                    format!("Failed to move output into '{}': {e}", path.display()),
                ));
            }
        }
        Ok(staged.into_iter().map(|(_, path)| path).collect())
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for (tmp, _) in &self.staged {
            let _ = fs::remove_file(tmp);
        }
    }
}
