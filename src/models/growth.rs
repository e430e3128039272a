//! Exponential growth model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - map a timestamp to the regression's independent variable (elapsed days)
//! - predict the value at that point given intercept and slope (log scale)

use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Slopes at or below this are treated as "not growing".
pub const MIN_GROWTH_SLOPE: f64 = 1e-12;

/// Fractional days from `origin` to `t` (negative when `t` precedes `origin`).
pub fn elapsed_days(t: DateTime<Utc>, origin: DateTime<Utc>) -> f64 {
    let delta = t - origin;
    let secs = delta.num_seconds() as f64;
    let nanos = delta.subsec_nanos() as f64 * 1e-9;
    (secs + nanos) / SECONDS_PER_DAY
}

/// Predict `value(t) = exp(intercept + slope * t)`.
pub fn predict(intercept: f64, slope: f64, elapsed_days: f64) -> f64 {
    (intercept + slope * elapsed_days).exp()
}

/// `ln(2) / slope`, or `None` when the slope does not describe growth.
pub fn doubling_time(slope: f64) -> Option<f64> {
    if slope.is_finite() && slope > MIN_GROWTH_SLOPE {
        Some(std::f64::consts::LN_2 / slope)
    } else {
        None
    }
}
