//! Mathematical utilities: least squares and goodness-of-fit.

pub mod ols;

pub use ols::*;
