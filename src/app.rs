//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - loads the raw records (HTTP, file, or synthetic)
//! - runs resampling, derived series, and the exponential fit
//! - prints reports/charts
//! - writes optional exports

use std::io;

use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalysisArgs, Command, PlotArgs};
use crate::data::configured_url;
use crate::domain::{AnalysisConfig, ChartKind, DataSource, WindowSpec};
use crate::error::AppError;

pub mod pipeline;

/// Number of rows `report` shows when `--tail` is not given.
const REPORT_TAIL: usize = 14;

/// Entry point for the `cases` binary.
pub fn run() -> Result<(), AppError> {
    // We want `cases` and `cases --synthetic` to behave like `cases tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => {
            init_logging(args.verbose, "info");
            handle_report(&args)
        }
        Command::Fit(args) => {
            init_logging(args.verbose, "info");
            handle_fit(&args)
        }
        Command::Table(args) => {
            init_logging(args.verbose, "info");
            handle_table(&args)
        }
        Command::Plot(args) => {
            init_logging(args.analysis.verbose, "info");
            handle_plot(&args)
        }
        Command::Tui(args) => {
            // Log lines would corrupt the alternate screen.
            init_logging(args.verbose, "off");
            handle_tui(&args)
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` selects debug and the command picks its default.
fn init_logging(verbose: bool, default_level: &str) {
    let default_level = if verbose && default_level != "off" {
        "debug"
    } else {
        default_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_report(args: &AnalysisArgs) -> Result<(), AppError> {
    let config = config_from_args(args);
    let ingest = pipeline::load_raw(&config.source)?;
    let run = pipeline::run_analysis(&ingest, &config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&config.source, &ingest, &run, &config)
    );
    println!("{}", crate::report::format_fit(&run, &config));

    if let Ok(fit) = &run.fit {
        let residuals = crate::report::compute_residuals(&run.rows, fit);
        let top = crate::report::largest_deviations(&residuals, 3);
        if !top.is_empty() {
            println!("Largest deviations from the model:");
            for r in top {
                println!(
                    "- {}: observed {:.0}, model {:.0} ({:+.1}%)",
                    r.timestamp.format("%Y-%m-%d"),
                    r.observed,
                    r.predicted,
                    (r.log_residual.exp() - 1.0) * 100.0
                );
            }
            println!();
        }
    }

    let tail = config.table_tail.or(Some(REPORT_TAIL));
    println!("{}", crate::report::format_table(&run, tail));

    if config.plot {
        for kind in ChartKind::ALL {
            let chart = crate::plot::chart_data(kind, &run, &config);
            println!(
                "{}",
                crate::plot::render_chart(&chart, config.plot_width, config.plot_height)
            );
        }
    }

    write_exports(&config, &run)
}

fn handle_fit(args: &AnalysisArgs) -> Result<(), AppError> {
    let config = config_from_args(args);
    let ingest = pipeline::load_raw(&config.source)?;
    let run = pipeline::run_analysis(&ingest, &config)?;

    println!("{}", crate::report::format_fit(&run, &config));
    write_exports(&config, &run)
}

fn handle_table(args: &AnalysisArgs) -> Result<(), AppError> {
    let config = config_from_args(args);
    let ingest = pipeline::load_raw(&config.source)?;
    let run = pipeline::run_analysis(&ingest, &config)?;

    if run.rows.is_empty() {
        return Err(AppError::new(
            3,
            "No daily rows: the readings do not span a full day.",
        ));
    }
    print!("{}", crate::report::format_table(&run, config.table_tail));
    write_exports(&config, &run)
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.analysis);

    let chart = match &args.fit_file {
        Some(path) => {
            let file = crate::io::read_fit_json(path)?;
            crate::plot::chart_from_fit_file(&file)
        }
        None => {
            let ingest = pipeline::load_raw(&config.source)?;
            let run = pipeline::run_analysis(&ingest, &config)?;
            crate::plot::chart_data(args.chart, &run, &config)
        }
    };

    println!(
        "{}",
        crate::plot::render_chart(&chart, config.plot_width, config.plot_height)
    );
    Ok(())
}

fn handle_tui(args: &AnalysisArgs) -> Result<(), AppError> {
    crate::tui::run(config_from_args(args))
}

fn write_exports(config: &AnalysisConfig, run: &pipeline::RunOutput) -> Result<(), AppError> {
    if let Some(path) = &config.export_table {
        crate::io::write_table_csv(path, run)?;
        info!(path = %path.display(), "wrote table CSV");
    }
    if let Some(path) = &config.export_fit {
        let fit = run
            .fit
            .as_ref()
            .map_err(|e| AppError::new(3, format!("Cannot export fit: {e}")))?;
        let file = crate::io::build_fit_file(fit, &run.rows, &config.source, Utc::now());
        crate::io::write_fit_json(path, &file)?;
        info!(path = %path.display(), "wrote fit JSON");
    }
    Ok(())
}

pub fn config_from_args(args: &AnalysisArgs) -> AnalysisConfig {
    let source = if args.synthetic {
        DataSource::Synthetic { seed: args.seed }
    } else if let Some(path) = &args.input {
        DataSource::File(path.clone())
    } else {
        DataSource::Url(configured_url(args.url.as_deref()))
    };

    AnalysisConfig {
        source,
        incidence_window: args.window,
        normalize: args.normalize,
        norm_period: args.norm_period,
        recovered_lead: args.recovered_lead,
        series: args.series,
        fit_window: WindowSpec {
            start: args.fit_start,
            end: args.fit_end,
            days: args.fit_days,
        },
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        table_tail: args.tail,
        export_table: args.export_table.clone(),
        export_fit: args.export_fit.clone(),
    }
}

/// Rewrite argv so `cases` defaults to `cases tui`.
///
/// Rules:
/// - `cases`                       -> `cases tui`
/// - `cases --synthetic ...`       -> `cases tui --synthetic ...`
/// - `cases --help/--version/-h`   -> unchanged (show top-level help/version)
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

    let is_subcommand = matches!(arg1.as_str(), "report" | "fit" | "table" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["cases"])), argv(&["cases", "tui"]));
    }

    #[test]
    fn leading_flag_is_a_tui_flag() {
        assert_eq!(
            rewrite_args(argv(&["cases", "--synthetic", "--window", "14"])),
            argv(&["cases", "tui", "--synthetic", "--window", "14"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for args in [
            vec!["cases", "report", "--synthetic"],
            vec!["cases", "plot", "--chart", "deaths"],
            vec!["cases", "--help"],
            vec!["cases", "-V"],
        ] {
            assert_eq!(rewrite_args(argv(&args)), argv(&args));
        }
    }

    #[test]
    fn config_maps_flags() {
        let cli = Cli::try_parse_from(rewrite_args(argv(&[
            "cases",
            "--synthetic",
            "--seed",
            "9",
            "--normalize",
            "--norm-period",
            "14",
            "--no-plot",
            "--fit-days",
            "10",
        ])))
        .unwrap();
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        let config = config_from_args(&args);
        assert_eq!(config.source, DataSource::Synthetic { seed: 9 });
        assert!(config.normalize);
        assert_eq!(config.norm_period, 14);
        assert!(!config.plot);
        assert_eq!(config.fit_window.days, 10);
        assert!(config.validate().is_ok());
    }
}
