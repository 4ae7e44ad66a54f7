//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments and installs the log subscriber
//! - runs the analysis pipeline
//! - prints reports/plots or opens the TUI
//! - writes the workbook and optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, FetchArgs};
use crate::domain::{AnalysisConfig, FetchConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `yc` binary.
pub fn run() -> Result<(), AppError> {
    // `yc` and `yc --output x.xlsx` behave like `yc tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Tui(args) => handle_tui(args),
        Command::Fetch(args) => handle_fetch(args),
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--log-level`.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let run = pipeline::run_analysis(&config)?;
    let written = pipeline::export(&config, &run)?;

    println!("{}", crate::report::format_run_summary(&run.analysis));
    println!("{}", crate::report::format_signal_summary(&run.analysis.stats));
    println!(
        "{}",
        crate::report::format_inversion_preview(&run.analysis.intervals, config.preview)
    );
    println!("{}", crate::report::format_links(&run.analysis.links));

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.analysis.rows,
            &run.analysis.intervals,
            &run.analysis.recession_bands,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    print_written(&written);
    Ok(())
}

fn handle_tui(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let run = pipeline::run_analysis(&config)?;
    let written = pipeline::export(&config, &run)?;

    crate::tui::run(&run)?;

    // Printed after the alternate screen is gone so it stays visible.
    print_written(&written);
    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let config = FetchConfig {
        dir: args.dir,
        observation_start: args.start,
    };
    for path in crate::data::fetch_inputs(&config)? {
        println!("{}", crate::report::format_saved(&path));
    }
    Ok(())
}

fn print_written(written: &pipeline::Written) {
    println!("{}", crate::report::format_saved(&written.workbook));
    for path in written.csv_tables.iter().chain(written.chart_svg.iter()) {
        println!("{}", crate::report::format_saved(path));
    }
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        dgs10_path: args.dgs10.clone(),
        dgs2_path: args.dgs2.clone(),
        usrec_path: args.usrec.clone(),
        output_path: args.output.clone(),
        csv_dir: args.csv_dir.clone(),
        chart_svg: args.chart_svg.clone(),
        preview: args.preview,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
    }
}

/// Rewrite argv so `yc` defaults to `yc tui`.
///
/// Rules:
/// - `yc`                      -> `yc tui`
/// - `yc --output x.xlsx ...`  -> `yc tui --output x.xlsx ...`
/// - `yc --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if matches!(arg1.as_str(), "analyze" | "tui" | "fetch") {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}
