//! Formatted terminal output: run summary, fit diagnostics, and the data table.
//!
//! We keep formatting code in one place so:
//! - the resampling/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use chrono::{DateTime, Utc};

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, DataSource};
use crate::io::ingest::IngestedData;

const TIME_FMT: &str = "%Y-%m-%d %H:%M";

/// Format the run summary (source, dataset stats, latest values).
pub fn format_run_summary(
    source: &DataSource,
    ingest: &IngestedData,
    run: &RunOutput,
    config: &AnalysisConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== cases - daily case curves ===\n");
    out.push_str(&format!("Source: {}\n", source.describe()));
    out.push_str(&format!(
        "Raw: n={} | read={} | skipped={} | duplicates={} | span=[{}, {}]\n",
        ingest.stats.n_records,
        ingest.rows_read,
        ingest.row_errors.len(),
        ingest.duplicates,
        fmt_time(ingest.stats.first),
        fmt_time(ingest.stats.last),
    ));
    for err in ingest.row_errors.iter().take(5) {
        out.push_str(&format!("  (line {}) {}\n", err.line, err.message));
    }
    if ingest.row_errors.len() > 5 {
        out.push_str(&format!("  ... {} more\n", ingest.row_errors.len() - 5));
    }

    match (run.rows.first(), run.rows.last()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Daily: n={} | [{}, {}]\n",
            run.rows.len(),
            fmt_time(first.timestamp),
            fmt_time(last.timestamp),
        )),
        _ => out.push_str("Daily: empty (readings do not span a full day)\n"),
    }

    let latest = ingest.stats.latest;
    out.push_str(&format!(
        "Latest: cases={} active={} recovered={} new={} deaths={}\n",
        fmt_count(latest.cumulative_cases),
        fmt_count(latest.active_cases),
        fmt_count(latest.recovered),
        fmt_count(latest.new_cases),
        fmt_count(latest.deaths),
    ));

    if let Some(Some(inc)) = run.derived.incidence.last() {
        let norm = if config.normalize {
            format!(" (normalized to {} days)", config.norm_period)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "Incidence: {}-day = {inc:.1} per 100k{norm}\n",
            config.incidence_window
        ));
    }
    out.push('\n');

    out
}

/// Format the exponential fit diagnostics, or the reason no fit exists.
pub fn format_fit(run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("Exponential fit ({}):\n", config.series.display_name()));
    out.push_str(&format!(
        "- window: {} .. {}\n",
        fmt_time(run.window.start),
        fmt_time(run.window.end)
    ));

    match &run.fit {
        Ok(fit) => {
            out.push_str(&format!("- rows: {}\n", fit.n_points));
            out.push_str(&format!(
                "- growth: {:.2} %/day (slope {:.6} ln/day)\n",
                (fit.slope.exp() - 1.0) * 100.0,
                fit.slope
            ));
            out.push_str(&format!("- doubling time: {}\n", fit.doubling_time));
            out.push_str(&format!("- R²: {:.4}\n", fit.r_squared));
        }
        Err(err) => {
            out.push_str(&format!("- cannot fit: {err}\n"));
        }
    }

    out
}

/// Format the resampled table with derived columns.
///
/// `tail` limits output to the last N rows.
pub fn format_table(run: &RunOutput, tail: Option<usize>) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<16} {:>10} {:>9} {:>10} {:>7} {:>7} {:>10} {:>10}\n",
            "time", "cases", "active", "recovered", "new", "deaths", "incidence", "model"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<16} {:-<10} {:-<9} {:-<10} {:-<7} {:-<7} {:-<10} {:-<10}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    let skip = tail.map(|n| run.rows.len().saturating_sub(n)).unwrap_or(0);
    let model = run.fit.as_ref().ok().map(|f| f.predicted.as_slice());

    for (i, row) in run.rows.iter().enumerate().skip(skip) {
        let c = &row.counts;
        let incidence = run.derived.incidence.get(i).copied().flatten();
        let predicted = model.and_then(|p| p.get(i).copied().flatten());
        out.push_str(
            format!(
                "{:<16} {:>10} {:>9} {:>10} {:>7} {:>7} {:>10} {:>10}\n",
                fmt_time(row.timestamp),
                fmt_count(c.cumulative_cases),
                fmt_count(c.active_cases),
                fmt_count(c.recovered),
                fmt_count(c.new_cases),
                fmt_count(c.deaths),
                fmt_opt(incidence, 1),
                fmt_opt(predicted, 0),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_time(t: DateTime<Utc>) -> String {
    t.format(TIME_FMT).to_string()
}

fn fmt_count(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::derived::DerivedSeries;
    use crate::domain::{Counts, DailyRow, FitWindow, Series};
    use crate::error::FitError;
    use crate::fit::fit_exponential;

    fn run(window_days: (i64, i64)) -> RunOutput {
        let t0 = Utc.with_ymd_and_hms(2020, 10, 1, 0, 0, 0).unwrap();
        let rows: Vec<DailyRow> = (0..3)
            .map(|d| DailyRow {
                timestamp: t0 + Duration::days(d),
                counts: Counts {
                    cumulative_cases: 100.0 * 2f64.powi(d as i32),
                    active_cases: 10.0,
                    recovered: 5.0,
                    new_cases: 2.5,
                    deaths: 1.0,
                },
            })
            .collect();
        let config = AnalysisConfig {
            incidence_window: 1,
            ..AnalysisConfig::default()
        };
        let window = FitWindow {
            start: t0 + Duration::days(window_days.0),
            end: t0 + Duration::days(window_days.1),
        };
        RunOutput {
            derived: DerivedSeries::compute(&rows, &config),
            fit: fit_exponential(&rows, Series::Cases, window),
            window,
            rows,
        }
    }

    #[test]
    fn table_marks_rows_outside_model_window() {
        let txt = format_table(&run((1, 2)), None);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("time"));
        assert_eq!(
            lines[2],
            "2020-10-01 00:00        100        10          5    2.50       1          -          -"
        );
        assert!(lines[3].ends_with("200"));
        assert!(lines[4].ends_with("400"));
    }

    #[test]
    fn table_tail_limits_rows() {
        let txt = format_table(&run((0, 2)), Some(1));
        assert_eq!(txt.lines().count(), 3);
        assert!(txt.lines().last().unwrap().starts_with("2020-10-03"));
    }

    #[test]
    fn fit_summary_reports_doubling_time_or_reason() {
        let config = AnalysisConfig::default();
        let ok = format_fit(&run((0, 2)), &config);
        assert!(ok.contains("- doubling time: 1.00 days"));
        assert!(ok.contains("- growth: 100.00 %/day"));
        assert!(ok.contains("- R²: 1.0000"));

        let mut failed = run((0, 2));
        failed.fit = Err(FitError::InsufficientData { found: 1 });
        let txt = format_fit(&failed, &config);
        assert!(txt.contains("- cannot fit: insufficient data: 1 row(s)"));
    }

    #[test]
    fn count_formatting() {
        assert_eq!(fmt_count(1234.0), "1234");
        assert_eq!(fmt_count(2.5), "2.50");
        assert_eq!(fmt_opt(None, 1), "-");
        assert_eq!(fmt_opt(Some(3.14159), 1), "3.1");
    }
}
