//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load raw records -> daily resampling -> derived series -> exponential fit
//!
//! Loading is separate from analysis so the TUI can re-run the analysis on
//! every parameter change without re-fetching.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::data::{DatasetClient, SyntheticSpec, generate_synthetic, resample_daily};
use crate::derived::DerivedSeries;
use crate::domain::{AnalysisConfig, DailyRow, DataSource, ExpFit, FitWindow};
use crate::error::{AppError, FitError};
use crate::fit::fit_exponential;
use crate::io::ingest::{IngestedData, ingest_csv, load_csv_file};

/// All computed outputs of a single analysis run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rows: Vec<DailyRow>,
    pub derived: DerivedSeries,
    pub window: FitWindow,
    /// A failed fit is an expected outcome for some windows, not a run failure.
    pub fit: Result<ExpFit, FitError>,
}

/// Load raw records from the configured source.
pub fn load_raw(source: &DataSource) -> Result<IngestedData, AppError> {
    let ingest = match source {
        DataSource::Url(url) => {
            let client = DatasetClient::new(url.clone())?;
            let text = client.fetch_csv()?;
            ingest_csv(&text)?
        }
        DataSource::File(path) => load_csv_file(path)?,
        DataSource::Synthetic { seed } => {
            let records = generate_synthetic(&SyntheticSpec::with_seed(*seed))?;
            IngestedData::from_records(records)?
        }
    };

    info!(
        source = %source.describe(),
        records = ingest.records.len(),
        skipped = ingest.row_errors.len(),
        duplicates = ingest.duplicates,
        "loaded raw records"
    );
    Ok(ingest)
}

/// Execute the analysis with the wall clock as "now".
pub fn run_analysis(ingest: &IngestedData, config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    run_analysis_at(ingest, config, Utc::now())
}

/// Execute the analysis against a fixed "now" (used for the default fit window).
pub fn run_analysis_at(
    ingest: &IngestedData,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> Result<RunOutput, AppError> {
    config.validate()?;

    let rows = resample_daily(&ingest.records);
    if rows.is_empty() {
        warn!("resampled table is empty (need readings spanning at least one day boundary)");
    }

    let derived = DerivedSeries::compute(&rows, config);

    let window = config.fit_window.resolve(now, Some(ingest.stats.last));
    let fit = fit_exponential(&rows, config.series, window);
    if let Err(err) = &fit {
        info!(%err, "exponential fit unavailable for window");
    }

    Ok(RunOutput {
        rows,
        derived,
        window,
        fit,
    })
}
