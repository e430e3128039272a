//! Series derived from the daily table.
//!
//! Both derived series are aligned with the table: one entry per row, `None`
//! where the value is not defined (too early for the incidence window, or past
//! the end for the shifted recovered curve).

use crate::domain::{AnalysisConfig, DailyRow, INCIDENCE_PER, POPULATION};

/// Derived columns for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub incidence: Vec<Option<f64>>,
    pub recovered_lead: Vec<Option<f64>>,
}

impl DerivedSeries {
    pub fn compute(rows: &[DailyRow], config: &AnalysisConfig) -> Self {
        let period = config.normalize.then_some(config.norm_period);
        Self {
            incidence: incidence(rows, config.incidence_window, period, POPULATION),
            recovered_lead: recovered_lead(rows, config.recovered_lead),
        }
    }
}

/// n-day incidence per 100,000 residents.
///
/// Row `i` holds the cumulative-case increase over the preceding `window` days,
/// scaled to `INCIDENCE_PER` residents. With `normalize_to = Some(p)` the value
/// is rescaled to a `p`-day window, so different window lengths stay comparable.
pub fn incidence(
    rows: &[DailyRow],
    window: usize,
    normalize_to: Option<usize>,
    population: f64,
) -> Vec<Option<f64>> {
    if window == 0 || !(population.is_finite() && population > 0.0) {
        return vec![None; rows.len()];
    }
    let scale = match normalize_to {
        Some(p) => p as f64 / window as f64,
        None => 1.0,
    };

    (0..rows.len())
        .map(|i| {
            let j = i.checked_sub(window)?;
            let delta = rows[i].counts.cumulative_cases - rows[j].counts.cumulative_cases;
            Some(delta * INCIDENCE_PER / population * scale)
        })
        .collect()
}

/// Recovered counts shifted `lead` days earlier.
///
/// Row `i` holds the recovered count of row `i + lead`, so a lead equal to the
/// typical illness duration lines the recovered curve up with the cases curve.
pub fn recovered_lead(rows: &[DailyRow], lead: usize) -> Vec<Option<f64>> {
    (0..rows.len())
        .map(|i| rows.get(i + lead).map(|r| r.counts.recovered))
        .collect()
}
