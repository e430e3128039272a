//! Chart data preparation shared by the ASCII renderer and the TUI.
//!
//! The x axis is fractional days since the Unix epoch so both renderers can work
//! with plain `f64` pairs and format dates only when drawing tick labels.

use chrono::{DateTime, Utc};

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, ChartKind, DailyRow, FitFile, Series};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Line,
    Bars,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub mark: Mark,
    /// Glyph used by the ASCII renderer.
    pub glyph: char,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub kind: ChartKind,
    pub title: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    /// Padded data bounds `([x0, x1], [y0, y1])`, or `None` for an empty chart.
    ///
    /// Bar charts always include zero so bars have a baseline.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut x = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y = [f64::INFINITY, f64::NEG_INFINITY];
        for s in &self.series {
            for &(px, py) in &s.points {
                if !(px.is_finite() && py.is_finite()) {
                    continue;
                }
                x = [x[0].min(px), x[1].max(px)];
                y = [y[0].min(py), y[1].max(py)];
            }
        }
        if !(x[0].is_finite() && y[0].is_finite()) {
            return None;
        }
        if self.series.iter().any(|s| s.mark == Mark::Bars) {
            y = [y[0].min(0.0), y[1].max(0.0)];
        }
        if x[1] <= x[0] {
            x = [x[0] - 0.5, x[1] + 0.5];
        }
        if y[1] <= y[0] {
            let pad = y[0].abs().max(1.0) * 0.05;
            y = [y[0] - pad, y[1] + pad];
        }
        Some((x, y))
    }
}

/// Map a timestamp onto the chart x axis.
pub fn to_x(t: DateTime<Utc>) -> f64 {
    t.timestamp() as f64 / SECONDS_PER_DAY
}

/// Format an x value as a calendar date.
pub fn x_to_date(x: f64) -> String {
    let secs = (x * SECONDS_PER_DAY).round() as i64;
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("{x:.1}"))
}

/// Build the series for one chart.
pub fn chart_data(kind: ChartKind, run: &RunOutput, config: &AnalysisConfig) -> ChartData {
    let rows = &run.rows;
    match kind {
        ChartKind::Cases => single(kind, "cases", observed(rows, Series::Cases, '*', Mark::Line)),
        ChartKind::Deaths => single(kind, "deaths", observed(rows, Series::Deaths, '*', Mark::Line)),
        ChartKind::Active => single(kind, "active", observed(rows, Series::Active, '*', Mark::Line)),
        ChartKind::NewCases => single(kind, "cases/day", observed(rows, Series::NewCases, '#', Mark::Bars)),
        ChartKind::Incidence => {
            let label = if config.normalize {
                format!("{}-day incidence (per {} days)", config.incidence_window, config.norm_period)
            } else {
                format!("{}-day incidence", config.incidence_window)
            };
            let series = ChartSeries {
                label,
                mark: Mark::Line,
                glyph: '*',
                points: aligned(rows, &run.derived.incidence),
            };
            single(kind, "per 100k", series)
        }
        ChartKind::Model => {
            let mut series = vec![observed(rows, config.series, '*', Mark::Line)];
            let title = match &run.fit {
                Ok(fit) => {
                    series.push(ChartSeries {
                        label: "exponential model".to_string(),
                        mark: Mark::Line,
                        glyph: '+',
                        points: aligned(rows, &fit.predicted),
                    });
                    format!(
                        "{} (doubling time {}, R²={:.4})",
                        kind.title(),
                        fit.doubling_time,
                        fit.r_squared
                    )
                }
                Err(err) => format!("{} (cannot fit: {err})", kind.title()),
            };
            ChartData {
                kind,
                title,
                y_label: config.series.display_name().to_string(),
                series,
            }
        }
        ChartKind::Recovered => {
            let lead = ChartSeries {
                label: format!("recovered (lead {} d)", config.recovered_lead),
                mark: Mark::Line,
                glyph: 'o',
                points: aligned(rows, &run.derived.recovered_lead),
            };
            ChartData {
                kind,
                title: kind.title().to_string(),
                y_label: "people".to_string(),
                series: vec![observed(rows, Series::Cases, '*', Mark::Line), lead],
            }
        }
    }
}

/// Observed vs. model chart from a saved fit (no dataset needed).
pub fn chart_from_fit_file(file: &FitFile) -> ChartData {
    let fit = &file.fit;
    let observed = ChartSeries {
        label: fit.series.display_name().to_string(),
        mark: Mark::Line,
        glyph: '*',
        points: file.grid.iter().map(|p| (to_x(p.timestamp), p.observed)).collect(),
    };
    let model = ChartSeries {
        label: "exponential model".to_string(),
        mark: Mark::Line,
        glyph: '+',
        points: file.grid.iter().map(|p| (to_x(p.timestamp), p.predicted)).collect(),
    };
    ChartData {
        kind: ChartKind::Model,
        title: format!(
            "{} (doubling time {}, R²={:.4}; {})",
            ChartKind::Model.title(),
            fit.doubling_time,
            fit.r_squared,
            file.source
        ),
        y_label: fit.series.display_name().to_string(),
        series: vec![observed, model],
    }
}

fn single(kind: ChartKind, y_label: &str, series: ChartSeries) -> ChartData {
    ChartData {
        kind,
        title: kind.title().to_string(),
        y_label: y_label.to_string(),
        series: vec![series],
    }
}

fn observed(rows: &[DailyRow], series: Series, glyph: char, mark: Mark) -> ChartSeries {
    ChartSeries {
        label: series.display_name().to_string(),
        mark,
        glyph,
        points: rows
            .iter()
            .map(|r| (to_x(r.timestamp), series.value(&r.counts)))
            .collect(),
    }
}

fn aligned(rows: &[DailyRow], values: &[Option<f64>]) -> Vec<(f64, f64)> {
    rows.iter()
        .zip(values)
        .filter_map(|(r, v)| v.map(|v| (to_x(r.timestamp), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::derived::DerivedSeries;
    use crate::domain::{Counts, FitWindow};
    use crate::error::FitError;
    use crate::fit::fit_exponential;

    fn run_output(fit_days: (i64, i64)) -> (RunOutput, AnalysisConfig) {
        let t0 = Utc.with_ymd_and_hms(2020, 10, 1, 0, 0, 0).unwrap();
        let rows: Vec<DailyRow> = (0..6)
            .map(|d| DailyRow {
                timestamp: t0 + Duration::days(d),
                counts: Counts {
                    cumulative_cases: 100.0 * 2f64.powi(d as i32),
                    recovered: d as f64,
                    new_cases: d as f64,
                    ..Counts::default()
                },
            })
            .collect();
        let config = AnalysisConfig {
            recovered_lead: 2,
            ..AnalysisConfig::default()
        };
        let window = FitWindow {
            start: t0 + Duration::days(fit_days.0),
            end: t0 + Duration::days(fit_days.1),
        };
        let run = RunOutput {
            derived: DerivedSeries::compute(&rows, &config),
            fit: fit_exponential(&rows, Series::Cases, window),
            window,
            rows,
        };
        (run, config)
    }

    #[test]
    fn model_chart_overlays_only_window() {
        let (run, config) = run_output((2, 4));
        let chart = chart_data(ChartKind::Model, &run, &config);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].points.len(), 6);
        assert_eq!(chart.series[1].points.len(), 3);
        assert!(chart.title.contains("doubling time 1.00 days"));
    }

    #[test]
    fn model_chart_reports_failed_fit() {
        let (mut run, config) = run_output((2, 4));
        run.fit = Err(FitError::InsufficientData { found: 0 });
        let chart = chart_data(ChartKind::Model, &run, &config);
        assert_eq!(chart.series.len(), 1);
        assert!(chart.title.contains("cannot fit"));
    }

    #[test]
    fn recovered_chart_uses_lead_shift() {
        let (run, config) = run_output((0, 5));
        let chart = chart_data(ChartKind::Recovered, &run, &config);
        let lead = &chart.series[1];
        assert_eq!(lead.points.len(), 4);
        assert_eq!(lead.points[0].1, 2.0);
    }

    #[test]
    fn bar_chart_bounds_include_zero() {
        let (run, config) = run_output((0, 5));
        let chart = chart_data(ChartKind::NewCases, &run, &config);
        let (_, y) = chart.bounds().unwrap();
        assert!(y[0] <= 0.0);
        assert_eq!(y[1], 5.0);
    }

    #[test]
    fn saved_fit_chart_pairs_observed_and_model() {
        let (run, _) = run_output((3, 5));
        let fit = run.fit.as_ref().unwrap();
        let source = crate::domain::DataSource::Synthetic { seed: 0 };
        let file = crate::io::build_fit_file(fit, &run.rows, &source, Utc::now());
        let chart = chart_from_fit_file(&file);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].points.len(), 3);
        let xs = |i: usize| chart.series[i].points.iter().map(|p| p.0).collect::<Vec<_>>();
        assert_eq!(xs(0), xs(1));
        assert_eq!(chart.series[0].points[0].1, 800.0);
        assert!(chart.title.contains("synthetic (seed 0)"));
    }

    #[test]
    fn dates_round_trip_through_axis() {
        let t = Utc.with_ymd_and_hms(2021, 2, 3, 0, 0, 0).unwrap();
        assert_eq!(x_to_date(to_x(t)), "2021-02-03");
    }
}
