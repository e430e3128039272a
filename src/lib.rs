//! `case-curves` library crate.
//!
//! The binary (`cases`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the resampling/fitting pipeline is shared by the CLI and the TUI
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod derived;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
