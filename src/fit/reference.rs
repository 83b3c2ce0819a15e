//! Reference histograms for recovery.
//!
//! The target of the fit is a set of reaction-time histograms conditioned on
//! choice, one pair per trial condition, produced by simulating the true
//! model. Candidate models are scored against these raw counts later.

use nalgebra::DVector;
use rand::prelude::*;

use crate::domain::{AddmParams, Choice, SimOptions, TrialCondition};
use crate::error::AppError;
use crate::math::histogram_counts;
use crate::sim::{FixationProfile, simulate_trial};

/// Left/right reaction-time histograms for one trial condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceHists {
    pub left: DVector<f64>,
    pub right: DVector<f64>,
}

/// Recovery target: shared bin edges plus per-condition raw counts.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub edges: Vec<f64>,
    /// Parallel to the condition list the reference was generated from.
    pub hists: Vec<ChoiceHists>,
}

impl ReferenceData {
    /// Counts summed across conditions, for aggregate reporting.
    pub fn totals(&self) -> ChoiceHists {
        let n_bins = self.edges.len().saturating_sub(1);
        let mut left = DVector::zeros(n_bins);
        let mut right = DVector::zeros(n_bins);
        for h in &self.hists {
            left += &h.left;
            right += &h.right;
        }
        ChoiceHists { left, right }
    }
}

/// Simulate the true model and bin its reaction times by choice.
///
/// Counts stay raw; the likelihood weighs log-mass vectors against them
/// directly, so normalizing here would silently change the objective.
pub fn generate_reference(
    true_params: &AddmParams,
    profile: &FixationProfile,
    conditions: &[TrialCondition],
    num_trials: usize,
    edges: &[f64],
    opts: &SimOptions,
    seed: u64,
) -> Result<ReferenceData, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hists = Vec::with_capacity(conditions.len());

    for condition in conditions {
        let mut rts_left = Vec::new();
        let mut rts_right = Vec::new();
        for trial in 0..num_trials {
            let simulated = simulate_trial(
                true_params,
                condition.value_left,
                condition.value_right,
                profile,
                opts,
                &mut rng,
            )
            .map_err(|e| {
                e.with_context(format!(
                    "Reference trial {trial} for condition {}",
                    condition.label()
                ))
            })?;
            match simulated.choice {
                Choice::Left => rts_left.push(simulated.rt),
                Choice::Right => rts_right.push(simulated.rt),
                Choice::Undecided => {}
            }
        }
        hists.push(ChoiceHists {
            left: histogram_counts(&rts_left, edges),
            right: histogram_counts(&rts_right, edges),
        });
    }

    Ok(ReferenceData {
        edges: edges.to_vec(),
        hists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn reference_is_deterministic_for_a_seed() {
        let params = AddmParams::new(0.006, 0.08, 0.5);
        let profile = test_profile();
        let conditions = vec![TrialCondition {
            value_left: 3.0,
            value_right: 0.0,
        }];
        let edges = rt_bin_edges(100.0, 40000.0).unwrap();
        let opts = SimOptions::default();

        let a = generate_reference(&params, &profile, &conditions, 6, &edges, &opts, 42).unwrap();
        let b = generate_reference(&params, &profile, &conditions, 6, &edges, &opts, 42).unwrap();
        assert_eq!(a.hists, b.hists);
    }

    #[test]
    fn counts_cover_every_simulated_trial() {
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
            generate_reference(&params, &profile, &conditions, 4, &edges, &opts, 7).unwrap();
        assert_eq!(reference.hists.len(), 2);
        for h in &reference.hists {
            assert!((h.left.sum() + h.right.sum() - 4.0).abs() < 1e-9);
        }

        let totals = reference.totals();
        let by_hand_left = &reference.hists[0].left + &reference.hists[1].left;
        assert_eq!(totals.left, by_hand_left);
        assert!((totals.left.sum() + totals.right.sum() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn zero_trials_produce_zero_counts() {
        let params = AddmParams::new(0.006, 0.08, 0.5);
        let profile = test_profile();
        let conditions = vec![TrialCondition {
            value_left: 3.0,
            value_right: 0.0,
        }];
        let edges = rt_bin_edges(100.0, 8000.0).unwrap();
        let opts = SimOptions::default();

        let reference =
            generate_reference(&params, &profile, &conditions, 0, &edges, &opts, 1).unwrap();
        assert_eq!(reference.hists.len(), 1);
        assert_eq!(reference.hists[0].left.sum(), 0.0);
        assert_eq!(reference.hists[0].right.sum(), 0.0);
    }
}
