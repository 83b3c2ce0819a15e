//! Reaction-time histogram utilities.
//!
//! The likelihood compares per-choice RT distributions, so the same binning
//! has to be applied to reference data and to freshly simulated trials.
//!
//! Binning convention (matches the usual numeric-library behavior):
//! - bins are half-open `[e_i, e_{i+1})`, the last bin is closed on the right
//! - values outside the edge range are dropped, not clamped
//! - counts are plain `f64` so they slot directly into vector math

use nalgebra::DVector;

use crate::error::AppError;

/// Build RT bin edges `0, step, 2*step, ...` up to and including the largest
/// multiple of `bin_step` that is `<= max_rt`.
pub fn rt_bin_edges(bin_step: f64, max_rt: f64) -> Result<Vec<f64>, AppError> {
    if !(bin_step.is_finite() && bin_step > 0.0) {
        return Err(AppError::new(
            2,
            format!("Invalid bin step: {bin_step} (must be finite and > 0)."),
        ));
    }
    if !(max_rt.is_finite() && max_rt >= bin_step) {
        return Err(AppError::new(
            2,
            format!("Invalid max RT: {max_rt} (must be finite and >= bin step)."),
        ));
    }

    let n = (max_rt / bin_step).floor() as usize;
    let mut edges = Vec::with_capacity(n + 1);
    for i in 0..=n {
        edges.push(i as f64 * bin_step);
    }
    Ok(edges)
}

/// Count values into the bins described by `edges`.
///
/// `edges` must be ascending with at least two entries (as produced by
/// [`rt_bin_edges`]); fewer than two edges yields an empty vector.
pub fn histogram_counts(values: &[f64], edges: &[f64]) -> DVector<f64> {
    if edges.len() < 2 {
        return DVector::zeros(0);
    }
    let n_bins = edges.len() - 1;
    let mut counts = DVector::zeros(n_bins);

    for &v in values {
        if !v.is_finite() || v < edges[0] || v > edges[n_bins] {
            continue;
        }
        // The right-most edge belongs to the last bin.
        let idx = if v >= edges[n_bins] {
            n_bins - 1
        } else {
            edges.partition_point(|&e| e <= v) - 1
        };
        counts[idx] += 1.0;
    }

    counts
}

/// Normalize counts to a probability mass. A zero-sum vector is returned
/// unchanged rather than divided.
pub fn normalize_mass(counts: &DVector<f64>) -> DVector<f64> {
    let sum = counts.sum();
    if sum > 0.0 { counts / sum } else { counts.clone() }
}

/// `ln` of each entry, with 0 substituted wherever the mass is 0. Bins with
/// zero simulated mass therefore contribute nothing to a likelihood dot
/// product, even when the reference histogram has mass there.
pub fn log_or_zero(mass: &DVector<f64>) -> DVector<f64> {
    mass.map(|p| if p > 0.0 { p.ln() } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_cover_zero_to_max_rt() {
        let edges = rt_bin_edges(100.0, 8000.0).unwrap();
        assert_eq!(edges.len(), 81);
        assert!((edges[0] - 0.0).abs() < 1e-12);
        assert!((edges[80] - 8000.0).abs() < 1e-12);
        assert!((edges[1] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn edges_reject_bad_settings() {
        assert_eq!(rt_bin_edges(0.0, 8000.0).unwrap_err().exit_code(), 2);
        assert_eq!(rt_bin_edges(100.0, 50.0).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn counting_is_half_open_with_closed_last_bin() {
        let edges = [0.0, 100.0, 200.0];
        let counts = histogram_counts(&[0.0, 99.9, 100.0, 200.0, 200.1, -5.0], &edges);
        assert_eq!(counts.len(), 2);
        // 0.0 and 99.9 land in the first bin; 100.0 opens the second;
        // 200.0 (the right-most edge) closes it; 200.1 and -5.0 are dropped.
        assert!((counts[0] - 2.0).abs() < 1e-12);
        assert!((counts[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_mass_divides_only_nonzero_sums() {
        let counts = DVector::from_row_slice(&[3.0, 1.0]);
        let mass = normalize_mass(&counts);
        assert!((mass[0] - 0.75).abs() < 1e-12);
        assert!((mass[1] - 0.25).abs() < 1e-12);
        assert!((mass.sum() - 1.0).abs() < 1e-12);

        let zeros = DVector::from_row_slice(&[0.0, 0.0]);
        let unchanged = normalize_mass(&zeros);
        assert_eq!(unchanged, zeros);
    }

    #[test]
    fn log_or_zero_keeps_empty_bins_silent() {
        let mass = DVector::from_row_slice(&[0.5, 0.0, 0.25]);
        let logs = log_or_zero(&mass);
        assert!((logs[0] - 0.5_f64.ln()).abs() < 1e-12);
        assert_eq!(logs[1], 0.0);
        assert!((logs[2] - 0.25_f64.ln()).abs() < 1e-12);
    }
}
