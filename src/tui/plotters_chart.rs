//! Plotters-powered case chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - bars and lines share one coordinate system
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::{ChartData, Mark};
use crate::plot::series::x_to_date;

/// High-contrast palette; series `i` uses `PALETTE[i % len]`.
const PALETTE: [RGBColor; 4] = [
    RGBColor(255, 255, 255), // observed: white
    RGBColor(0, 255, 255),   // overlay: cyan
    RGBColor(255, 200, 0),
    RGBColor(0, 255, 0),
];

/// A render-only view of prepared chart data.
///
/// All series and bounds are computed outside the render call.
pub struct CasePlottersChart<'a> {
    pub chart: &'a ChartData,
    /// X bounds (days since the Unix epoch).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for CasePlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let data = self.chart;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc(data.y_label.as_str())
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| x_to_date(*v))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (idx, series) in data.series.iter().enumerate() {
                let color = PALETTE[idx % PALETTE.len()];
                match series.mark {
                    Mark::Line => {
                        chart.draw_series(LineSeries::new(series.points.iter().copied(), &color))?;
                    }
                    Mark::Bars => {
                        // Filled rectangles render unreliably through the canvas
                        // backend; a vertical path per day reads as a bar.
                        chart.draw_series(
                            series
                                .points
                                .iter()
                                .map(|&(x, y)| PathElement::new(vec![(x, 0.0), (x, y)], color)),
                        )?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
