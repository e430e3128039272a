//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - line series: the series glyph along Bresenham segments
//! - bar series: vertical columns from the zero baseline
//! - overlays (second and later series) are drawn on top of the first

use crate::plot::series::{ChartData, Mark, x_to_date};

/// Render one chart into a text block (header, grid, optional legend).
pub fn render_chart(chart: &ChartData, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_bounds, y_bounds)) = chart.bounds() else {
        return format!("{}: no data\n", chart.title);
    };
    let [t_min, t_max] = x_bounds;
    let (y_min, y_max) = pad_range(y_bounds[0], y_bounds[1], 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for (idx, series) in chart.series.iter().enumerate() {
        let overwrite = idx > 0;
        match series.mark {
            Mark::Line => draw_curve(&mut grid, &series.points, series.glyph, overwrite, t_min, t_max, y_min, y_max),
            Mark::Bars => draw_bars(&mut grid, &series.points, series.glyph, t_min, t_max, y_min, y_max),
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{}: {} .. {} | y=[{y_min:.1}, {y_max:.1}] {}\n",
        chart.title,
        x_to_date(t_min),
        x_to_date(t_max),
        chart.y_label,
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    if chart.series.len() > 1 {
        let entries: Vec<String> = chart
            .series
            .iter()
            .map(|s| format!("{} {}", s.glyph, s.label))
            .collect();
        out.push_str(&format!("legend: {}\n", entries.join(" | ")));
    }

    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

#[allow(clippy::too_many_arguments)]
fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    ch: char,
    overwrite: bool,
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        if !(t.is_finite() && y.is_finite()) {
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, ch, overwrite),
            None => grid[yy][x] = ch,
        }
        prev = Some((x, yy));
    }
}

fn draw_bars(grid: &mut [Vec<char>], bars: &[(f64, f64)], ch: char, t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();
    let base = map_y(0.0, y_min, y_max, height);

    for &(t, y) in bars {
        if !(t.is_finite() && y.is_finite()) {
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let top = map_y(y, y_min, y_max, height);
        let (lo, hi) = if top <= base { (top, base) } else { (base, top) };
        for row in grid.iter_mut().take(hi + 1).skip(lo) {
            row[x] = ch;
        }
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char, overwrite: bool) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && (overwrite || grid[y0 as usize][x0 as usize] == ' ')
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChartKind;
    use crate::plot::series::ChartSeries;

    fn line(label: &str, glyph: char, points: Vec<(f64, f64)>) -> ChartSeries {
        ChartSeries {
            label: label.to_string(),
            mark: Mark::Line,
            glyph,
            points,
        }
    }

    #[test]
    fn plot_golden_snapshot_overlay() {
        let chart = ChartData {
            kind: ChartKind::Recovered,
            title: "Cases vs recovered".to_string(),
            y_label: "people".to_string(),
            series: vec![
                line("cases", '*', vec![(0.0, 10.0), (9.0, 10.0)]),
                line("recovered", '+', vec![(0.0, 20.0), (9.0, 20.0)]),
            ],
        };

        let txt = render_chart(&chart, 10, 5);
        let expected = concat!(
            "Cases vs recovered: 1970-01-01 .. 1970-01-10 | y=[9.5, 20.5] people\n",
            "++++++++++\n",
            "          \n",
            "          \n",
            "          \n",
            "**********\n",
            "legend: * cases | + recovered\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn plot_golden_snapshot_bars() {
        let chart = ChartData {
            kind: ChartKind::NewCases,
            title: "New cases per day".to_string(),
            y_label: "cases/day".to_string(),
            series: vec![ChartSeries {
                label: "new cases".to_string(),
                mark: Mark::Bars,
                glyph: '#',
                points: vec![(0.0, 1.0), (9.0, 4.0)],
            }],
        };

        let txt = render_chart(&chart, 10, 5);
        let expected = concat!(
            "New cases per day: 1970-01-01 .. 1970-01-10 | y=[-0.2, 4.2] cases/day\n",
            "         #\n",
            "         #\n",
            "         #\n",
            "#        #\n",
            "#        #\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_chart_renders_placeholder() {
        let chart = ChartData {
            kind: ChartKind::Incidence,
            title: "Incidence per 100k".to_string(),
            y_label: "per 100k".to_string(),
            series: vec![line("incidence", '*', Vec::new())],
        };
        assert_eq!(render_chart(&chart, 40, 10), "Incidence per 100k: no data\n");
    }

    #[test]
    fn overlay_wins_shared_cells() {
        let chart = ChartData {
            kind: ChartKind::Model,
            title: "m".to_string(),
            y_label: "y".to_string(),
            series: vec![
                line("obs", '*', vec![(0.0, 0.0), (9.0, 9.0)]),
                line("model", '+', vec![(0.0, 0.0), (9.0, 9.0)]),
            ],
        };
        let txt = render_chart(&chart, 10, 10);
        assert!(!txt.lines().skip(1).take(10).any(|l| l.contains('*')));
    }
}
