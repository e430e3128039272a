//! Seeded synthetic case records for offline runs and demos.
//!
//! The generator mimics the shape of the published data: readings at irregular
//! intervals, cumulative counts that never decrease, and derived recovered /
//! deaths / active columns.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Counts, RawRecord};
use crate::error::AppError;

/// Parameters of the synthetic epidemic.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub seed: u64,
    /// Length of the generated series.
    pub days: u32,
    pub initial_cases: f64,
    /// Growth rate of cumulative cases in `ln(cases)` per day.
    pub growth_per_day: f64,
    /// Std dev of the multiplicative noise on cumulative cases (log scale).
    pub noise: f64,
    /// Cases recover this many days after being reported.
    pub recovery_days: f64,
    pub fatality_rate: f64,
    /// Bounds (hours) of the gap between consecutive readings.
    pub gap_hours: (f64, f64),
}

impl SyntheticSpec {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            days: 90,
            initial_cases: 20.0,
            growth_per_day: 0.045,
            noise: 0.02,
            recovery_days: 14.0,
            fatality_rate: 0.015,
            gap_hours: (4.0, 30.0),
        }
    }
}

/// First synthetic reading.
pub fn synthetic_origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 3, 2, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub fn generate_synthetic(spec: &SyntheticSpec) -> Result<Vec<RawRecord>, AppError> {
    if spec.days == 0 {
        return Err(AppError::new(2, "Synthetic series length must be > 0 days."));
    }
    let (gap_lo, gap_hi) = spec.gap_hours;
    if !(gap_lo.is_finite() && gap_hi.is_finite() && gap_lo > 0.0 && gap_hi > gap_lo) {
        return Err(AppError::new(2, "Invalid synthetic reading gap range."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise.max(0.0))
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let origin = synthetic_origin();
    let horizon_hours = f64::from(spec.days) * 24.0;

    let mut records = Vec::new();
    let mut hours = 0.0_f64;
    let mut prev = Counts::default();

    while hours <= horizon_hours {
        let day = hours / 24.0;
        let expected = spec.initial_cases * (spec.growth_per_day * day).exp();
        let noisy = expected * normal.sample(&mut rng).exp();
        let cumulative = noisy.round().max(prev.cumulative_cases);

        let recovered_expected = if day >= spec.recovery_days {
            spec.initial_cases * (spec.growth_per_day * (day - spec.recovery_days)).exp()
        } else {
            0.0
        };
        let deaths = (cumulative * spec.fatality_rate).round().max(prev.deaths);
        let recovered = recovered_expected
            .round()
            .max(prev.recovered)
            .min(cumulative - deaths);

        let counts = Counts {
            cumulative_cases: cumulative,
            active_cases: cumulative - recovered - deaths,
            recovered,
            new_cases: cumulative - prev.cumulative_cases,
            deaths,
        };

        records.push(RawRecord {
            timestamp: origin + Duration::seconds((hours * 3600.0).round() as i64),
            counts,
        });

        prev = counts;
        hours += rng.gen_range(gap_lo..gap_hi);
    }

    Ok(records)
}
