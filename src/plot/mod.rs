//! Chart preparation and terminal rendering.

pub mod ascii;
pub mod series;

pub use ascii::render_chart;
pub use series::{ChartData, ChartSeries, Mark, chart_data, chart_from_fit_file};
