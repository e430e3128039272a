//! Exponential growth fitting.
//!
//! Responsibilities:
//!
//! - select rows inside the user-chosen window
//! - log-linear OLS fit and diagnostics (doubling time, R²)
//! - model predictions over the full daily table

pub mod exponential;

pub use exponential::*;
