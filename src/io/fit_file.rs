//! Read/write fit JSON files.
//!
//! Fit JSON is the portable representation of an exponential fit:
//! - model parameters (intercept, slope) and diagnostics
//! - run metadata (data source, generation time)
//! - the observed vs. predicted values inside the window, for quick plotting
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::{DailyRow, DataSource, ExpFit, FitFile, FitGridPoint};
use crate::error::AppError;

/// Build the serializable fit document.
pub fn build_fit_file(
    fit: &ExpFit,
    rows: &[DailyRow],
    source: &DataSource,
    generated_at: DateTime<Utc>,
) -> FitFile {
    let grid = rows
        .iter()
        .zip(&fit.predicted)
        .filter_map(|(row, predicted)| {
            predicted.map(|predicted| FitGridPoint {
                timestamp: row.timestamp,
                observed: fit.series.value(&row.counts),
                predicted,
            })
        })
        .collect();

    FitFile {
        tool: "cases".to_string(),
        source: source.describe(),
        generated_at,
        fit: fit.clone(),
        grid,
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, file: &FitFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit: FitFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::domain::{Counts, DoublingTime, FitWindow, Series};
    use crate::fit::fit_exponential;

    #[test]
    fn grid_holds_window_rows_and_survives_json() {
        let t0 = Utc.with_ymd_and_hms(2020, 10, 1, 0, 0, 0).unwrap();
        let rows: Vec<DailyRow> = (0..5)
            .map(|d| DailyRow {
                timestamp: t0 + Duration::days(d),
                counts: Counts {
                    cumulative_cases: 50.0 * 2f64.powi(d as i32),
                    ..Counts::default()
                },
            })
            .collect();
        let window = FitWindow {
            start: t0 + Duration::days(2),
            end: t0 + Duration::days(4),
        };
        let fit = fit_exponential(&rows, Series::Cases, window).unwrap();
        let doc = build_fit_file(&fit, &rows, &DataSource::Synthetic { seed: 1 }, t0);

        assert_eq!(doc.grid.len(), 3);
        assert_eq!(doc.grid[0].observed, 200.0);
        assert_eq!(doc.source, "synthetic (seed 1)");

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"kind\":\"days\""));
        let back: FitFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fit.n_points, 3);
        assert!(matches!(back.fit.doubling_time, DoublingTime::Days(d) if (d - 1.0).abs() < 1e-9));
    }

    #[test]
    fn missing_fit_file_is_an_input_error() {
        let err = read_fit_json(Path::new("/nonexistent/fit.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
