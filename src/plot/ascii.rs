//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - reference (data) histogram: `o` columns
//! - model histogram: `#` columns
//! - overlap: `@`

use nalgebra::DVector;

use crate::fit::reference::ChoiceHists;

/// Render stacked data-vs-model RT panels, one per choice.
///
/// Both series in a panel are normalized to unit mass and share one vertical
/// scale, so a shape mismatch stays visible even when trial counts differ.
pub fn render_rt_panels(
    edges: &[f64],
    data: &ChoiceHists,
    model: &ChoiceHists,
    width: usize,
    height: usize,
) -> String {
    let mut out = String::new();
    out.push_str("data: o | model: # | overlap: @\n");
    out.push_str(&render_panel(
        "RT histogram (left choices)",
        edges,
        &data.left,
        &model.left,
        width,
        height,
    ));
    out.push('\n');
    out.push_str(&render_panel(
        "RT histogram (right choices)",
        edges,
        &data.right,
        &model.right,
        width,
        height,
    ));
    out
}

fn render_panel(
    label: &str,
    edges: &[f64],
    data: &DVector<f64>,
    model: &DVector<f64>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let lo = edges.first().copied().unwrap_or(0.0);
    let hi = edges.last().copied().unwrap_or(1.0);

    let data_cols = column_masses(data, edges, lo, hi, width);
    let model_cols = column_masses(model, edges, lo, hi, width);
    let peak = data_cols
        .iter()
        .chain(model_cols.iter())
        .fold(0.0_f64, |acc, &v| acc.max(v));

    let mut grid = vec![vec![' '; width]; height];

    // Draw data first (so model bars can overlay into `@`).
    for (x, &v) in data_cols.iter().enumerate() {
        fill_column(&mut grid, x, bar_rows(v, peak, height), 'o');
    }
    for (x, &v) in model_cols.iter().enumerate() {
        fill_column(&mut grid, x, bar_rows(v, peak, height), '#');
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{label}: rt=[{lo:.0}, {hi:.0}]ms | peak mass={peak:.3}\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Fold bin masses into terminal columns (several bins may share a column).
fn column_masses(counts: &DVector<f64>, edges: &[f64], lo: f64, hi: f64, width: usize) -> Vec<f64> {
    let mut cols = vec![0.0; width];
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return cols;
    }

    let n_bins = edges.len().saturating_sub(1).min(counts.len());
    for i in 0..n_bins {
        let center = 0.5 * (edges[i] + edges[i + 1]);
        let x = map_x(center, lo, hi, width);
        cols[x] += counts[i] / total;
    }
    cols
}

fn bar_rows(v: f64, peak: f64, height: usize) -> usize {
    if peak <= 0.0 {
        return 0;
    }
    let rows = ((v / peak) * height as f64).round() as usize;
    rows.min(height)
}

fn fill_column(grid: &mut [Vec<char>], x: usize, rows: usize, ch: char) {
    let height = grid.len();
    for r in 0..rows.min(height) {
        let cell = &mut grid[height - 1 - r][x];
        *cell = if *cell == ' ' || *cell == ch { ch } else { '@' };
    }
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let span = t_max - t_min;
    if span <= 0.0 {
        return 0;
    }
    let u = ((t - t_min) / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}
