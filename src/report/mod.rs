//! Reporting utilities: fit residuals and the rows that deviate most.

pub mod format;

pub use format::{format_fit, format_run_summary, format_table};

use chrono::{DateTime, Utc};

use crate::domain::{DailyRow, ExpFit};

/// Observed vs. modelled value for one row inside the fit window.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResidual {
    pub timestamp: DateTime<Utc>,
    pub observed: f64,
    pub predicted: f64,
    /// `ln(observed) - ln(predicted)`; positive means above the model.
    pub log_residual: f64,
}

/// Residuals for every row that has a model prediction.
pub fn compute_residuals(rows: &[DailyRow], fit: &ExpFit) -> Vec<FitResidual> {
    rows.iter()
        .zip(&fit.predicted)
        .filter_map(|(row, predicted)| {
            let predicted = (*predicted)?;
            let observed = fit.series.value(&row.counts);
            let log_residual = if observed > 0.0 && predicted > 0.0 {
                observed.ln() - predicted.ln()
            } else {
                f64::NAN
            };
            Some(FitResidual {
                timestamp: row.timestamp,
                observed,
                predicted,
                log_residual,
            })
        })
        .collect()
}

/// The `top_n` residuals with the largest absolute log deviation.
pub fn largest_deviations(residuals: &[FitResidual], top_n: usize) -> Vec<FitResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.log_residual
            .abs()
            .partial_cmp(&a.log_residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::domain::{Counts, FitWindow, Series};
    use crate::fit::fit_exponential;

    #[test]
    fn residuals_cover_window_and_rank_outlier_first() {
        let t0 = Utc.with_ymd_and_hms(2020, 10, 1, 0, 0, 0).unwrap();
        let values = [100.0, 200.0, 500.0, 800.0, 1600.0, 3200.0];
        let rows: Vec<DailyRow> = values
            .iter()
            .enumerate()
            .map(|(d, &v)| DailyRow {
                timestamp: t0 + Duration::days(d as i64),
                counts: Counts {
                    cumulative_cases: v,
                    ..Counts::default()
                },
            })
            .collect();
        let window = FitWindow {
            start: t0 + Duration::days(1),
            end: t0 + Duration::days(5),
        };
        let fit = fit_exponential(&rows, Series::Cases, window).unwrap();

        let residuals = compute_residuals(&rows, &fit);
        assert_eq!(residuals.len(), 5);
        assert_eq!(residuals[0].timestamp, t0 + Duration::days(1));

        let top = largest_deviations(&residuals, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].observed, 500.0);
        assert!(top[0].log_residual > 0.0);
    }
}
