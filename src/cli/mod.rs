//! Command-line parsing for the `yc` binary.
//!
//! Argument parsing and command dispatch stay separate from the analysis code;
//! `app` turns these structs into an immutable `AnalysisConfig`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "yc", version, about = "Yield-curve inversion -> recession signal analyzer")]
pub struct Cli {
    /// Log filter used when `RUST_LOG` is unset (e.g. `info`, `yc_recession=debug`).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze the CSV inputs, write the workbook, print the report and an ASCII chart.
    Analyze(AnalyzeArgs),
    /// Same analysis, then open the interactive chart (q / Esc to quit).
    Tui(AnalyzeArgs),
    /// Download DGS10, DGS2 and USREC from FRED into CSV files.
    Fetch(FetchArgs),
}

/// Inputs, outputs and presentation options shared by `analyze` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// 10-year treasury yield CSV.
    #[arg(long, value_name = "CSV", default_value = "DGS10.csv")]
    pub dgs10: PathBuf,

    /// 2-year treasury yield CSV.
    #[arg(long, value_name = "CSV", default_value = "DGS2.csv")]
    pub dgs2: PathBuf,

    /// NBER recession indicator CSV (0/1).
    #[arg(long, value_name = "CSV", default_value = "USREC.csv")]
    pub usrec: PathBuf,

    /// Workbook to write.
    #[arg(short, long, value_name = "XLSX", default_value = "yieldcurve_analysis_complete.xlsx")]
    pub output: PathBuf,

    /// Also write each table as `<sheet>.csv` into this directory.
    #[arg(long, value_name = "DIR")]
    pub csv_dir: Option<PathBuf>,

    /// Also save the chart as SVG.
    #[arg(long, value_name = "SVG")]
    pub chart_svg: Option<PathBuf>,

    /// Number of inversion intervals shown in the terminal preview.
    #[arg(long, default_value_t = 10)]
    pub preview: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `yc fetch`.
#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Directory the CSV files are written into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Earliest observation date (YYYY-MM-DD); defaults to the full history.
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_defaults_use_fixed_file_names() {
        let cli = Cli::parse_from(["yc", "analyze"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.dgs10, PathBuf::from("DGS10.csv"));
        assert_eq!(args.usrec, PathBuf::from("USREC.csv"));
        assert_eq!(args.output, PathBuf::from("yieldcurve_analysis_complete.xlsx"));
        assert_eq!(args.preview, 10);
        assert!(args.plot && !args.no_plot);
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn fetch_parses_start_date() {
        let cli = Cli::parse_from(["yc", "fetch", "--dir", "data", "--start", "1990-01-01"]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.dir, PathBuf::from("data"));
        assert_eq!(args.start, NaiveDate::from_ymd_opt(1990, 1, 1));
    }

    #[test]
    fn fetch_rejects_bad_dates() {
        assert!(Cli::try_parse_from(["yc", "fetch", "--start", "01/01/1990"]).is_err());
    }
}
