//! Shared analysis pipeline used by both the `analyze` and `tui` front-ends.
//!
//! load -> align -> detect -> link -> summarize, then the exports. The
//! front-ends only decide how to present a finished `RunOutput`.

use std::path::PathBuf;

use crate::domain::{AnalysisConfig, ObservedSeries, SeriesCode};
use crate::error::{AppError, ErrorKind};
use crate::io::export::{StagedFiles, Table, build_tables, stage_csv_tables, stage_workbook};
use crate::io::ingest::{align, load_series};
use crate::plot::{SpreadChartData, render_svg};
use crate::signal::{Analysis, analyze};

/// SVG canvas size in pixels.
pub const SVG_SIZE: (u32, u32) = (1400, 600);

/// All computed outputs of one run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dgs10: ObservedSeries,
    pub dgs2: ObservedSeries,
    pub usrec: ObservedSeries,
    pub analysis: Analysis,
    pub tables: Vec<Table>,
}

/// Paths written by [`export`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Written {
    pub workbook: PathBuf,
    pub csv_tables: Vec<PathBuf>,
    pub chart_svg: Option<PathBuf>,
}

/// Load the three input files named by `config` and analyze them.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let dgs10 = load_series(config.input_path(SeriesCode::Dgs10), SeriesCode::Dgs10)?;
    let dgs2 = load_series(config.input_path(SeriesCode::Dgs2), SeriesCode::Dgs2)?;
    let usrec = load_series(config.input_path(SeriesCode::Usrec), SeriesCode::Usrec)?;

    run_with_series(dgs10, dgs2, usrec)
}

/// Analyze series that are already in memory.
pub fn run_with_series(dgs10: ObservedSeries, dgs2: ObservedSeries, usrec: ObservedSeries) -> Result<RunOutput, AppError> {
    let rows = align(&dgs10, &dgs2, &usrec);
    let analysis = analyze(&rows, &usrec)?;
    let tables = build_tables(&analysis);

    Ok(RunOutput {
        dgs10,
        dgs2,
        usrec,
        analysis,
        tables,
    })
}

/// Write the workbook plus the optional CSV tables and SVG chart.
///
/// Every file is rendered and staged as a temp file first; nothing is moved
/// into place unless all of them were staged.
pub fn export(config: &AnalysisConfig, run: &RunOutput) -> Result<Written, AppError> {
    let svg = match &config.chart_svg {
        Some(_) => SpreadChartData::from_analysis(&run.analysis)
            .map(|data| render_svg(&data, SVG_SIZE))
            .transpose()?,
        None => None,
    };

    let mut staged = StagedFiles::new(ErrorKind::Export);
    stage_workbook(&mut staged, &config.output_path, &run.tables)?;

    let csv_tables = match &config.csv_dir {
        Some(dir) => stage_csv_tables(&mut staged, dir, &run.tables)?,
        None => Vec::new(),
    };

    let chart_svg = match (&config.chart_svg, svg) {
        (Some(path), Some(svg)) => {
            staged.stage(path, svg.as_bytes())?;
            Some(path.clone())
        }
        (Some(path), None) => {
            tracing::warn!(path = %path.display(), "no aligned observations; chart not written");
            None
        }
        _ => None,
    };

    let written = staged.commit()?;
    tracing::info!(files = written.len(), workbook = %config.output_path.display(), "wrote exports");

    Ok(Written {
        workbook: config.output_path.clone(),
        csv_tables,
        chart_svg,
    })
}
