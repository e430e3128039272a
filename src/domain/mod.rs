//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and resampled observations (`RawRecord`, `DailyRow`, `Counts`)
//! - selectors and chart kinds (`Series`, `ChartKind`)
//! - fit inputs and outputs (`WindowSpec`, `FitWindow`, `ExpFit`, `DoublingTime`)
//! - the run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
