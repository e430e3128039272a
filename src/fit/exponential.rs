//! Log-linear exponential fit over a time window.
//!
//! Given the daily table, a series and a closed window `[t0, t1]`:
//! - select the rows inside the window
//! - regress `ln(value)` on fractional days since `t0`
//! - report doubling time and R² of the log-scale fit
//! - predict over the whole table, blanking rows outside the window

use tracing::debug;

use crate::domain::{DailyRow, DoublingTime, ExpFit, FitWindow, Series};
use crate::error::FitError;
use crate::math::{fit_line, r_squared};
use crate::models::{doubling_time, elapsed_days, predict};

/// Fit `ln(series) = intercept + slope * days_since(window.start)`.
pub fn fit_exponential(rows: &[DailyRow], series: Series, window: FitWindow) -> Result<ExpFit, FitError> {
    if window.start > window.end {
        return Err(FitError::InvalidWindow {
            start: window.start.to_rfc3339(),
            end: window.end.to_rfc3339(),
        });
    }

    let selected: Vec<&DailyRow> = rows.iter().filter(|r| window.contains(r.timestamp)).collect();
    if selected.len() < 2 {
        return Err(FitError::InsufficientData {
            found: selected.len(),
        });
    }

    let mut t = Vec::with_capacity(selected.len());
    let mut log_y = Vec::with_capacity(selected.len());
    for row in &selected {
        let value = series.value(&row.counts);
        if !(value.is_finite() && value > 0.0) {
            return Err(FitError::NonPositiveValue {
                series: series.display_name(),
                value,
                date: row.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            });
        }
        t.push(elapsed_days(row.timestamp, window.start));
        log_y.push(value.ln());
    }

    let (intercept, slope) = fit_line(&t, &log_y).ok_or(FitError::Singular)?;

    let fitted_log: Vec<f64> = t.iter().map(|&ti| intercept + slope * ti).collect();
    let r2 = r_squared(&log_y, &fitted_log);

    let doubling = match doubling_time(slope) {
        Some(days) => DoublingTime::Days(days),
        None => DoublingTime::Undefined,
    };

    let predicted = rows
        .iter()
        .map(|r| {
            window
                .contains(r.timestamp)
                .then(|| predict(intercept, slope, elapsed_days(r.timestamp, window.start)))
        })
        .collect();

    debug!(
        series = series.column_name(),
        n = selected.len(),
        slope,
        r2,
        "exponential fit"
    );

    Ok(ExpFit {
        series,
        window,
        intercept,
        slope,
        doubling_time: doubling,
        r_squared: r2,
        n_points: selected.len(),
        predicted,
    })
}
