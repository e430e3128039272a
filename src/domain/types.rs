//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during resampling and fitting
//! - exported to JSON/CSV
//! - rendered by both the CLI and the TUI without conversion

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Residents of the city the default dataset covers (Jena).
pub const POPULATION: f64 = 108_127.0;

/// Incidence is reported per this many residents.
pub const INCIDENCE_PER: f64 = 100_000.0;

pub const INCIDENCE_WINDOW_RANGE: (usize, usize) = (1, 100);
pub const NORM_PERIOD_RANGE: (usize, usize) = (1, 100);
pub const RECOVERED_LEAD_RANGE: (usize, usize) = (0, 50);
/// Fit window length in days when no explicit start is given.
pub const FIT_DAYS_RANGE: (usize, usize) = (1, 3650);

/// The five numeric fields every record carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Counts {
    pub cumulative_cases: f64,
    pub active_cases: f64,
    pub recovered: f64,
    pub new_cases: f64,
    pub deaths: f64,
}

/// A single upstream observation, as published.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    pub timestamp: DateTime<Utc>,
    pub counts: Counts,
}

/// One row of the daily-equidistant table.
///
/// `timestamp` is the row's target instant, not the timestamp of the raw record
/// whose counts were copied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRow {
    pub timestamp: DateTime<Utc>,
    pub counts: Counts,
}

/// Which numeric field to model or plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Series {
    Cases,
    Active,
    Recovered,
    NewCases,
    Deaths,
}

impl Series {
    pub const ALL: [Series; 5] = [
        Series::Cases,
        Series::Active,
        Series::Recovered,
        Series::NewCases,
        Series::Deaths,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Series::Cases => "cumulative cases",
            Series::Active => "active cases",
            Series::Recovered => "recovered",
            Series::NewCases => "new cases",
            Series::Deaths => "deaths",
        }
    }

    /// Column name used in exports.
    pub fn column_name(self) -> &'static str {
        match self {
            Series::Cases => "cumulative_cases",
            Series::Active => "active_cases",
            Series::Recovered => "recovered",
            Series::NewCases => "new_cases",
            Series::Deaths => "deaths",
        }
    }

    pub fn value(self, counts: &Counts) -> f64 {
        match self {
            Series::Cases => counts.cumulative_cases,
            Series::Active => counts.active_cases,
            Series::Recovered => counts.recovered,
            Series::NewCases => counts.new_cases,
            Series::Deaths => counts.deaths,
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// The charts the tool can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    /// Cumulative cases over time.
    Cases,
    /// Deaths over time.
    Deaths,
    /// New cases per day (bar chart).
    NewCases,
    /// Active cases over time.
    Active,
    /// n-day incidence per 100,000 residents.
    Incidence,
    /// Selected series with the exponential model overlaid.
    Model,
    /// Cumulative cases vs lead-shifted recovered.
    Recovered,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Cases,
        ChartKind::Deaths,
        ChartKind::NewCases,
        ChartKind::Active,
        ChartKind::Incidence,
        ChartKind::Model,
        ChartKind::Recovered,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Cases => "Cumulative cases",
            ChartKind::Deaths => "Deaths",
            ChartKind::NewCases => "New cases per day",
            ChartKind::Active => "Active cases",
            ChartKind::Incidence => "Incidence per 100k",
            ChartKind::Model => "Exponential model",
            ChartKind::Recovered => "Cases vs recovered",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Where the raw records come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// HTTP GET of a CSV document.
    Url(String),
    /// A CSV file on disk.
    File(PathBuf),
    /// Seeded synthetic records (offline demos).
    Synthetic { seed: u64 },
}

impl DataSource {
    pub fn describe(&self) -> String {
        match self {
            DataSource::Url(url) => url.clone(),
            DataSource::File(path) => path.display().to_string(),
            DataSource::Synthetic { seed } => format!("synthetic (seed {seed})"),
        }
    }
}

/// How the end of the fit window is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitEnd {
    /// Wall-clock time when the analysis runs.
    Now,
    /// The latest raw timestamp in the dataset.
    Latest,
    At(DateTime<Utc>),
}

/// User-facing description of the fit window, resolved per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    /// Explicit start; when absent the start is `end - days`.
    pub start: Option<DateTime<Utc>>,
    pub end: FitEnd,
    pub days: u32,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            start: None,
            end: FitEnd::Now,
            days: 7,
        }
    }
}

impl WindowSpec {
    /// Resolve to a concrete closed window.
    ///
    /// `latest` is the latest raw timestamp (if any); `FitEnd::Latest` falls back
    /// to `now` when the dataset is empty.
    pub fn resolve(&self, now: DateTime<Utc>, latest: Option<DateTime<Utc>>) -> FitWindow {
        let end = match self.end {
            FitEnd::Now => now,
            FitEnd::Latest => latest.unwrap_or(now),
            FitEnd::At(t) => t,
        };
        let start = self.start.unwrap_or_else(|| {
            end.checked_sub_signed(Duration::days(i64::from(self.days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });
        FitWindow { start, end }
    }
}

/// A closed time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FitWindow {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Doubling time of a fitted exponential.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "lowercase")]
pub enum DoublingTime {
    Days(f64),
    /// The fitted slope is zero or negative: the series is not growing.
    Undefined,
}

impl DoublingTime {
    pub fn days(self) -> Option<f64> {
        match self {
            DoublingTime::Days(d) => Some(d),
            DoublingTime::Undefined => None,
        }
    }
}

impl std::fmt::Display for DoublingTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoublingTime::Days(d) => write!(f, "{d:.2} days"),
            DoublingTime::Undefined => write!(f, "undefined (series not growing)"),
        }
    }
}

/// Result of a log-linear exponential fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpFit {
    pub series: Series,
    pub window: FitWindow,
    /// `ln(value)` at the window start.
    pub intercept: f64,
    /// Growth rate in `ln(value)` per day.
    pub slope: f64,
    pub doubling_time: DoublingTime,
    pub r_squared: f64,
    /// Number of rows inside the window.
    pub n_points: usize,
    /// One entry per resampled row; `None` outside the window.
    pub predicted: Vec<Option<f64>>,
}

/// A saved fit (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub fit: ExpFit,
    pub grid: Vec<FitGridPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitGridPoint {
    pub timestamp: DateTime<Utc>,
    pub observed: f64,
    pub predicted: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults) or edited by the TUI.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub source: DataSource,

    /// Incidence window length in days.
    pub incidence_window: usize,
    /// Scale incidence to `norm_period` days.
    pub normalize: bool,
    pub norm_period: usize,
    /// Shift the recovered curve this many days earlier.
    pub recovered_lead: usize,

    pub series: Series,
    pub fit_window: WindowSpec,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Show only the last N table rows.
    pub table_tail: Option<usize>,

    pub export_table: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Url(crate::data::DEFAULT_DATA_URL.to_string()),
            incidence_window: 7,
            normalize: false,
            norm_period: 7,
            recovered_lead: 0,
            series: Series::Cases,
            fit_window: WindowSpec::default(),
            plot: true,
            plot_width: 100,
            plot_height: 20,
            table_tail: None,
            export_table: None,
            export_fit: None,
        }
    }
}

impl AnalysisConfig {
    /// Check the user-adjustable parameters against their allowed ranges.
    pub fn validate(&self) -> Result<(), AppError> {
        check_range("--window", self.incidence_window, INCIDENCE_WINDOW_RANGE)?;
        check_range("--norm-period", self.norm_period, NORM_PERIOD_RANGE)?;
        check_range("--recovered-lead", self.recovered_lead, RECOVERED_LEAD_RANGE)?;
        if self.fit_window.start.is_none() {
            check_range("--fit-days", self.fit_window.days as usize, FIT_DAYS_RANGE)?;
        }
        Ok(())
    }
}

fn check_range(flag: &str, value: usize, (lo, hi): (usize, usize)) -> Result<(), AppError> {
    if value < lo || value > hi {
        return Err(AppError::new(
            2,
            format!("`{flag}` must be between {lo} and {hi} (got {value})."),
        ));
    }
    Ok(())
}
