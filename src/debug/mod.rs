//! Debug bundle writer for inspecting raw inputs, resampling, and fits.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, Series};
use crate::error::AppError;
use crate::fit::fit_exponential;
use crate::io::ingest::IngestedData;
use crate::report::{compute_residuals, format_table};

/// Write a markdown bundle under `debug/` and return its path.
pub fn write_debug_bundle(
    ingest: &IngestedData,
    run: &RunOutput,
    config: &AnalysisConfig,
) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let last = ingest.stats.last.format("%Y%m%d");
    let path = dir.join(format!("cases_debug_{last}_{}_{ts}.md", config.series.column_name()));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    file.write_all(render_debug_bundle(ingest, run, config).as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;

    Ok(path)
}

/// Render the bundle contents.
pub fn render_debug_bundle(ingest: &IngestedData, run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_bundle(&mut out, ingest, run, config);
    out
}

fn write_bundle(
    out: &mut String,
    ingest: &IngestedData,
    run: &RunOutput,
    config: &AnalysisConfig,
) -> std::fmt::Result {
    writeln!(out, "# cases debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- source: {}", config.source.describe())?;
    writeln!(
        out,
        "- incidence: window={} normalize={} period={}",
        config.incidence_window, config.normalize, config.norm_period
    )?;
    writeln!(out, "- recovered_lead: {}", config.recovered_lead)?;
    writeln!(
        out,
        "- fit: series={} start={:?} end={:?} days={}",
        config.series.column_name(),
        config.fit_window.start,
        config.fit_window.end,
        config.fit_window.days
    )?;
    writeln!(out, "- resolved window: {} .. {}", run.window.start, run.window.end)?;

    writeln!(out, "\n## Raw records")?;
    writeln!(
        out,
        "- kept={} read={} skipped={} duplicates={}",
        ingest.records.len(),
        ingest.rows_read,
        ingest.row_errors.len(),
        ingest.duplicates
    )?;
    writeln!(out, "- span: {} .. {}", ingest.stats.first, ingest.stats.last)?;
    for err in &ingest.row_errors {
        writeln!(out, "- line {}: {}", err.line, err.message)?;
    }

    writeln!(out, "\n### Last raw records")?;
    writeln!(out, "| timestamp | cases | active | recovered | new | deaths |")?;
    writeln!(out, "| - | - | - | - | - | - |")?;
    let skip = ingest.records.len().saturating_sub(10);
    for r in ingest.records.iter().skip(skip) {
        let c = &r.counts;
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            r.timestamp, c.cumulative_cases, c.active_cases, c.recovered, c.new_cases, c.deaths
        )?;
    }

    writeln!(out, "\n## Fits by series")?;
    writeln!(out, "| series | n | slope | doubling | r2 | note |")?;
    writeln!(out, "| - | - | - | - | - | - |")?;
    for series in Series::ALL {
        match fit_exponential(&run.rows, series, run.window) {
            Ok(fit) => writeln!(
                out,
                "| {} | {} | {:.6} | {} | {:.4} | |",
                series.column_name(),
                fit.n_points,
                fit.slope,
                fit.doubling_time,
                fit.r_squared
            )?,
            Err(err) => writeln!(out, "| {} | - | - | - | - | {err} |", series.column_name())?,
        }
    }

    if let Ok(fit) = &run.fit {
        writeln!(out, "\n### Residuals ({})", fit.series.column_name())?;
        writeln!(out, "| timestamp | observed | model | log residual |")?;
        writeln!(out, "| - | - | - | - |")?;
        for r in compute_residuals(&run.rows, fit) {
            writeln!(
                out,
                "| {} | {:.1} | {:.3} | {:+.5} |",
                r.timestamp, r.observed, r.predicted, r.log_residual
            )?;
        }
    }

    writeln!(out, "\n## Daily table")?;
    writeln!(out, "```")?;
    write!(out, "{}", format_table(run, None))?;
    writeln!(out, "```")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::app::pipeline::run_analysis_at;
    use crate::domain::{Counts, DataSource, FitEnd, RawRecord, WindowSpec};

    #[test]
    fn bundle_lists_every_series_and_the_table() {
        let t0 = Utc.with_ymd_and_hms(2020, 11, 1, 9, 0, 0).unwrap();
        let records = (0..6)
            .map(|d| RawRecord {
                timestamp: t0 + Duration::days(d),
                counts: Counts {
                    cumulative_cases: 100.0 + 10.0 * d as f64,
                    active_cases: 20.0,
                    recovered: 0.0,
                    new_cases: 10.0,
                    deaths: 0.0,
                },
            })
            .collect();
        let ingest = IngestedData::from_records(records).unwrap();
        let config = AnalysisConfig {
            source: DataSource::Synthetic { seed: 1 },
            fit_window: WindowSpec {
                start: None,
                end: FitEnd::Latest,
                days: 3,
            },
            ..AnalysisConfig::default()
        };
        let run = run_analysis_at(&ingest, &config, Utc::now()).unwrap();

        let md = render_debug_bundle(&ingest, &run, &config);
        assert!(md.starts_with("# cases debug bundle\n"));
        for series in Series::ALL {
            assert!(md.contains(&format!("| {} |", series.column_name())));
        }
        // Recovered and deaths are zero, so their fits fail with a reason.
        assert!(md.contains("| recovered | - | - | - | - | invalid data"));
        assert!(md.contains("### Residuals (cumulative_cases)"));
        assert!(md.contains("## Daily table\n```\ntime"));
    }
}
