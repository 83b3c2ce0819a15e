//! Histogram-based model scoring.
//!
//! A candidate model is scored without trial-level densities: it is
//! simulated for every condition, its reaction times are binned by choice
//! over the reference edges and normalized to probability mass, and the
//! reference's raw counts are weighed against the log of that mass. A bin
//! the candidate never reached contributes zero rather than negative
//! infinity, which keeps sparse histograms comparable at the cost of
//! under-penalizing them (preserved behavior).

use nalgebra::DVector;
use rand::prelude::*;

use crate::domain::{AddmParams, Choice, SimOptions, TrialCondition};
use crate::error::AppError;
use crate::fit::reference::ReferenceData;
use crate::math::{histogram_counts, log_or_zero, normalize_mass};
use crate::sim::{FixationProfile, simulate_trial};

/// Score one choice-conditioned reaction-time list against data counts.
pub fn log_likelihood_term(
    rts: &[f64],
    edges: &[f64],
    data_counts: &DVector<f64>,
) -> Result<f64, AppError> {
    let counts = histogram_counts(rts, edges);
    if counts.len() != data_counts.len() {
        return Err(AppError::new(
            4,
            format!(
                "Histogram length mismatch: simulated {} bins, data {} bins.",
                counts.len(),
                data_counts.len()
            ),
        ));
    }
    let mass = normalize_mass(&counts);
    Ok(log_or_zero(&mass).dot(data_counts))
}

/// Log-likelihood of the reference data under one candidate model.
///
/// Simulates `num_simulations` trials per condition with the caller's RNG,
/// so two calls with identically seeded RNGs produce identical scores. Any
/// failed simulation aborts the whole evaluation.
pub fn model_log_likelihood(
    params: &AddmParams,
    profile: &FixationProfile,
    conditions: &[TrialCondition],
    num_simulations: usize,
    reference: &ReferenceData,
    opts: &SimOptions,
    rng: &mut StdRng,
) -> Result<f64, AppError> {
    if reference.hists.len() != conditions.len() {
        return Err(AppError::new(
            4,
            format!(
                "Reference holds {} histogram pairs for {} conditions.",
                reference.hists.len(),
                conditions.len()
            ),
        ));
    }

    let mut total = 0.0;
    for (condition, hists) in conditions.iter().zip(&reference.hists) {
        let mut rts_left = Vec::new();
        let mut rts_right = Vec::new();
        for sim in 0..num_simulations {
            let simulated = simulate_trial(
                params,
                condition.value_left,
                condition.value_right,
                profile,
                opts,
                rng,
            )
            .map_err(|e| {
                e.with_context(format!(
                    "Simulation {sim} for condition {} under model {}",
                    condition.label(),
                    params.label()
                ))
            })?;
            match simulated.choice {
                Choice::Left => rts_left.push(simulated.rt),
                Choice::Right => rts_right.push(simulated.rt),
                Choice::Undecided => {}
            }
        }

        total += log_likelihood_term(&rts_left, &reference.edges, &hists.left)?;
        total += log_likelihood_term(&rts_right, &reference.edges, &hists.right)?;
    }

    if !total.is_finite() {
        return Err(AppError::new(
            4,
            format!("Log-likelihood for model {} is not finite.", params.label()),
        ));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::reference::generate_reference;
    use crate::math::rt_bin_edges;
    use std::collections::HashMap;

    fn test_profile() -> FixationProfile {
        let pool = |keys: &[i64]| -> HashMap<i64, Vec<f64>> {
            keys.iter().map(|&k| (k, vec![2000.0])).collect()
        };
        FixationProfile::new(
            vec![300.0],
            vec![100.0],
            1.0,
            vec![pool(&[3, -3]), pool(&[3, -3]), pool(&[3, -3])],
        )
        .unwrap()
    }

    #[test]
    fn term_is_nonpositive_for_matching_bins() {
        let edges = vec![0.0, 200.0, 400.0];
        let data = DVector::from_vec(vec![2.0, 1.0]);

        // Mass [2/3, 1/3] against counts [2, 1].
        let spread = log_likelihood_term(&[100.0, 100.0, 300.0], &edges, &data).unwrap();
        let expected = 2.0 * (2.0f64 / 3.0).ln() + (1.0f64 / 3.0).ln();
        assert!((spread - expected).abs() < 1e-12);
        assert!(spread < 0.0);

        // All simulated mass in one bin: the empty bin is silently skipped,
        // so the divergent model outscores the matching one.
        let divergent = log_likelihood_term(&[300.0, 300.0, 300.0], &edges, &data).unwrap();
        assert_eq!(divergent, 0.0);
        assert!(divergent > spread);
    }

    #[test]
    fn term_rejects_mismatched_bin_counts() {
        let edges = vec![0.0, 200.0, 400.0];
        let data = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let err = log_likelihood_term(&[100.0], &edges, &data).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn zero_simulations_score_zero() {
        let params = AddmParams::new(0.006, 0.08, 0.5);
        let profile = test_profile();
        let conditions = vec![TrialCondition {
            value_left: 3.0,
            value_right: 0.0,
        }];
        let edges = rt_bin_edges(100.0, 8000.0).unwrap();
        let opts = SimOptions::default();
        let reference =
            generate_reference(&params, &profile, &conditions, 5, &edges, &opts, 3).unwrap();

        let mut rng = StdRng::seed_from_u64(21);
        let ll = model_log_likelihood(&params, &profile, &conditions, 0, &reference, &opts, &mut rng)
            .unwrap();
        assert_eq!(ll, 0.0);
    }

    #[test]
    fn likelihood_is_deterministic_and_nonpositive() {
        let params = AddmParams::new(0.006, 0.08, 0.5);
        let profile = test_profile();
        let conditions = vec![
            TrialCondition {
                value_left: 3.0,
                value_right: 0.0,
            },
            TrialCondition {
                value_left: 0.0,
                value_right: 3.0,
            },
        ];
        let edges = rt_bin_edges(100.0, 40000.0).unwrap();
        let opts = SimOptions::default();
        let reference =
            generate_reference(&params, &profile, &conditions, 8, &edges, &opts, 5).unwrap();

        let mut rng_a = StdRng::seed_from_u64(17);
        let a = model_log_likelihood(&params, &profile, &conditions, 8, &reference, &opts, &mut rng_a)
            .unwrap();
        let mut rng_b = StdRng::seed_from_u64(17);
        let b = model_log_likelihood(&params, &profile, &conditions, 8, &reference, &opts, &mut rng_b)
            .unwrap();
        assert_eq!(a, b);
        assert!(a <= 0.0);
    }

    #[test]
    fn mismatched_reference_is_rejected() {
        let params = AddmParams::new(0.006, 0.08, 0.5);
        let profile = test_profile();
        let conditions = vec![TrialCondition {
            value_left: 3.0,
            value_right: 0.0,
        }];
        let edges = rt_bin_edges(100.0, 8000.0).unwrap();
        let opts = SimOptions::default();
        let reference = ReferenceData {
            edges: edges.clone(),
            hists: Vec::new(),
        };

        let mut rng = StdRng::seed_from_u64(9);
        let err = model_log_likelihood(&params, &profile, &conditions, 1, &reference, &opts, &mut rng)
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
