//! Command-line parsing for the case-curve tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the resampling/fitting code.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

use crate::domain::{ChartKind, FitEnd, Series};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cases", version, about = "Daily COVID-19 case curves with exponential growth fits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the data summary, fit diagnostics, and charts; optionally export.
    Report(AnalysisArgs),
    /// Print the exponential fit diagnostics only (useful for scripting).
    Fit(AnalysisArgs),
    /// Print the resampled daily table with derived columns.
    Table(AnalysisArgs),
    /// Render one chart, or a previously exported fit JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `cases report`, but renders
    /// charts in a terminal UI using Ratatui.
    Tui(AnalysisArgs),
}

/// Options shared by every analysis command.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// CSV URL to fetch (overrides `CASES_DATA_URL`).
    #[arg(long, conflicts_with_all = ["input", "synthetic"])]
    pub url: Option<String>,

    /// Read a local CSV file instead of fetching.
    #[arg(short = 'f', long, value_name = "CSV", conflicts_with = "synthetic")]
    pub input: Option<PathBuf>,

    /// Use a seeded synthetic dataset (offline).
    #[arg(long)]
    pub synthetic: bool,

    /// Seed for `--synthetic`.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Incidence window in days (1-100).
    #[arg(long, default_value_t = 7)]
    pub window: usize,

    /// Normalize incidence to `--norm-period` days.
    #[arg(long)]
    pub normalize: bool,

    /// Normalization period in days (1-100).
    #[arg(long, default_value_t = 7)]
    pub norm_period: usize,

    /// Shift the recovered curve this many days earlier (0-50).
    #[arg(long, default_value_t = 0)]
    pub recovered_lead: usize,

    /// Series to fit.
    #[arg(long, value_enum, default_value_t = Series::Cases)]
    pub series: Series,

    /// Fit window start (RFC 3339 or YYYY-MM-DD); default is end minus `--fit-days`.
    #[arg(long, value_parser = parse_datetime)]
    pub fit_start: Option<DateTime<Utc>>,

    /// Fit window end: `now`, `latest` (latest record), or a date/time.
    #[arg(long, value_parser = parse_fit_end, default_value = "now")]
    pub fit_end: FitEnd,

    /// Fit window length in days when `--fit-start` is not given.
    #[arg(long, default_value_t = 7)]
    pub fit_days: u32,

    /// Render ASCII charts in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Show only the last N table rows.
    #[arg(long)]
    pub tail: Option<usize>,

    /// Export the daily table (with derived columns) to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_table: Option<PathBuf>,

    /// Export the exponential fit to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_fit: Option<PathBuf>,

    /// Verbose logging on stderr (`RUST_LOG` takes precedence).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options for plotting.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Chart to render.
    #[arg(long, value_enum, default_value_t = ChartKind::Model)]
    pub chart: ChartKind,

    /// Plot a fit JSON produced by `cases report --export-fit` instead of fetching data.
    #[arg(long, value_name = "JSON")]
    pub fit_file: Option<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Parse RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| format!("invalid date/time '{s}' (expected RFC 3339 or YYYY-MM-DD)"))
}

/// Parse `--fit-end`.
pub fn parse_fit_end(s: &str) -> Result<FitEnd, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "now" => Ok(FitEnd::Now),
        "latest" => Ok(FitEnd::Latest),
        _ => parse_datetime(s).map(FitEnd::At),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dates_accept_rfc3339_and_plain_days() {
        assert_eq!(
            parse_datetime("2021-03-01").unwrap(),
            Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("2021-03-01T10:30:00+01:00").unwrap(),
            Utc.with_ymd_and_hms(2021, 3, 1, 9, 30, 0).unwrap()
        );
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn fit_end_keywords() {
        assert_eq!(parse_fit_end("now").unwrap(), FitEnd::Now);
        assert_eq!(parse_fit_end("LATEST").unwrap(), FitEnd::Latest);
        assert!(matches!(parse_fit_end("2021-01-05").unwrap(), FitEnd::At(_)));
    }

    #[test]
    fn report_flags_parse() {
        let cli = Cli::try_parse_from([
            "cases",
            "report",
            "--synthetic",
            "--window",
            "14",
            "--fit-end",
            "latest",
            "--series",
            "new-cases",
        ])
        .unwrap();
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert!(args.synthetic);
        assert_eq!(args.window, 14);
        assert_eq!(args.fit_end, FitEnd::Latest);
        assert_eq!(args.series, Series::NewCases);
    }

    #[test]
    fn source_flags_conflict() {
        assert!(Cli::try_parse_from(["cases", "fit", "--synthetic", "--input", "x.csv"]).is_err());
    }
}
