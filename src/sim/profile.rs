//! Empirical fixation profile.
//!
//! The simulator does not draw gaze behavior from a parametric model; it
//! resamples durations observed in real trials. The profile pools:
//!
//! - pre-trial latencies (time before the first item fixation)
//! - transitions (gaps between item fixations)
//! - item fixation durations, keyed by fixation order and by the signed
//!   value difference between the fixated and unfixated item
//!
//! Fixation pools form a two-level lookup: an order bucket (capped, so late
//! fixations reuse the last bucket) and a discretized value-difference key
//! inside each bucket.

use std::collections::HashMap;

use rand::prelude::*;

use crate::domain::{ExperimentTrial, FixItem};
use crate::error::AppError;

/// Cap a 1-based fixation order to the configured number of pools.
pub fn fixation_bucket(fix_number: usize, num_buckets: usize) -> usize {
    fix_number.min(num_buckets.max(1))
}

/// Discretized signed value difference, fixated minus unfixated.
pub fn value_diff_key(fixated: f64, unfixated: f64) -> i64 {
    (fixated - unfixated).round() as i64
}

/// Summary counts for reporting.
#[derive(Debug, Clone)]
pub struct ProfileStats {
    pub n_latencies: usize,
    pub n_transitions: usize,
    pub n_fixation_samples: usize,
    pub n_buckets: usize,
    pub prob_fix_left_first: f64,
}

/// Pooled empirical durations, immutable after construction.
#[derive(Debug, Clone)]
pub struct FixationProfile {
    latencies: Vec<f64>,
    transitions: Vec<f64>,
    prob_fix_left_first: f64,
    /// Index 0 holds fixation order 1.
    fixations: Vec<HashMap<i64, Vec<f64>>>,
}

impl FixationProfile {
    pub fn new(
        latencies: Vec<f64>,
        transitions: Vec<f64>,
        prob_fix_left_first: f64,
        fixations: Vec<HashMap<i64, Vec<f64>>>,
    ) -> Result<Self, AppError> {
        if latencies.is_empty() {
            return Err(AppError::new(3, "Fixation profile has no latency samples."));
        }
        if transitions.is_empty() {
            return Err(AppError::new(3, "Fixation profile has no transition samples."));
        }
        if fixations.is_empty() {
            return Err(AppError::new(3, "Fixation profile has no fixation pools."));
        }
        if !(prob_fix_left_first.is_finite() && (0.0..=1.0).contains(&prob_fix_left_first)) {
            return Err(AppError::new(
                2,
                format!("Invalid left-first probability: {prob_fix_left_first} (must be in [0, 1])."),
            ));
        }

        let all_durations = latencies
            .iter()
            .chain(transitions.iter())
            .chain(fixations.iter().flat_map(|pool| pool.values().flatten()));
        for &v in all_durations {
            if !(v.is_finite() && v >= 0.0) {
                return Err(AppError::new(
                    2,
                    format!("Invalid profile duration: {v} (must be finite and >= 0)."),
                ));
            }
        }

        Ok(Self {
            latencies,
            transitions,
            prob_fix_left_first,
            fixations,
        })
    }

    pub fn prob_fix_left_first(&self) -> f64 {
        self.prob_fix_left_first
    }

    pub fn num_buckets(&self) -> usize {
        self.fixations.len()
    }

    pub fn sample_latency(&self, rng: &mut StdRng) -> f64 {
        self.latencies.choose(rng).copied().unwrap_or(0.0)
    }

    pub fn sample_transition(&self, rng: &mut StdRng) -> f64 {
        self.transitions.choose(rng).copied().unwrap_or(0.0)
    }

    /// Draw a fixation duration for the given order and value-difference key.
    ///
    /// The order is capped to the available buckets. An absent or empty pool
    /// is a sampling failure and fails the enclosing simulation.
    pub fn sample_fixation(
        &self,
        fix_number: usize,
        diff_key: i64,
        rng: &mut StdRng,
    ) -> Result<f64, AppError> {
        let bucket = fixation_bucket(fix_number, self.fixations.len());
        let pool = self.fixations[bucket - 1]
            .get(&diff_key)
            .filter(|samples| !samples.is_empty())
            .ok_or_else(|| {
                AppError::new(
                    3,
                    format!("No fixation samples for bucket {bucket} at value difference {diff_key}."),
                )
            })?;
        Ok(pool.choose(rng).copied().unwrap_or(0.0))
    }

    pub fn stats(&self) -> ProfileStats {
        ProfileStats {
            n_latencies: self.latencies.len(),
            n_transitions: self.transitions.len(),
            n_fixation_samples: self
                .fixations
                .iter()
                .map(|pool| pool.values().map(Vec::len).sum::<usize>())
                .sum(),
            n_buckets: self.fixations.len(),
            prob_fix_left_first: self.prob_fix_left_first,
        }
    }
}

/// Estimate a fixation profile from loaded trials.
///
/// Per trial: leading no-item segments sum to one latency sample, no-item
/// segments between item fixations become transition samples, and item
/// fixation durations are pooled by capped order and value-difference key.
/// The final segment of each trial is truncated by the decision and is not
/// pooled. Trials without any item fixation are skipped.
pub fn estimate_profile(
    trials: &[ExperimentTrial],
    subject_filter: &[String],
    num_fix_buckets: usize,
) -> Result<FixationProfile, AppError> {
    let num_fix_buckets = num_fix_buckets.max(1);

    let mut latencies = Vec::new();
    let mut transitions = Vec::new();
    let mut fixations: Vec<HashMap<i64, Vec<f64>>> = vec![HashMap::new(); num_fix_buckets];
    let mut count_left_first = 0usize;
    let mut count_trials = 0usize;

    for trial in trials {
        if !subject_filter.is_empty() && !subject_filter.iter().any(|s| s == &trial.subject) {
            continue;
        }
        let Some(first_item_idx) = trial.fixations.iter().position(|f| f.item != FixItem::None)
        else {
            continue;
        };

        let latency: f64 = trial.fixations[..first_item_idx]
            .iter()
            .map(|f| f.duration)
            .sum();
        latencies.push(latency);

        if trial.fixations[first_item_idx].item == FixItem::Left {
            count_left_first += 1;
        }
        count_trials += 1;

        let last_idx = trial.fixations.len() - 1;
        let mut fix_number = 0usize;
        for (i, fix) in trial.fixations.iter().enumerate().skip(first_item_idx) {
            match fix.item {
                FixItem::None => {
                    if i < last_idx {
                        transitions.push(fix.duration);
                    }
                }
                item => {
                    fix_number += 1;
                    if i < last_idx {
                        let bucket = fixation_bucket(fix_number, num_fix_buckets);
                        let (fixated, unfixated) = if item == FixItem::Left {
                            (trial.value_left, trial.value_right)
                        } else {
                            (trial.value_right, trial.value_left)
                        };
                        fixations[bucket - 1]
                            .entry(value_diff_key(fixated, unfixated))
                            .or_default()
                            .push(fix.duration);
                    }
                }
            }
        }
    }

    if count_trials == 0 {
        return Err(AppError::new(
            3,
            "No trials with item fixations to estimate a profile from.",
        ));
    }

    let prob_fix_left_first = count_left_first as f64 / count_trials as f64;
    FixationProfile::new(latencies, transitions, prob_fix_left_first, fixations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Choice, Fixation};

    fn trial(subject: &str, vl: f64, vr: f64, fixations: Vec<(i64, f64)>) -> ExperimentTrial {
        ExperimentTrial {
            subject: subject.to_string(),
            trial: 0,
            rt: fixations.iter().map(|&(_, d)| d).sum(),
            choice: Choice::Left,
            value_left: vl,
            value_right: vr,
            fixations: fixations
                .into_iter()
                .map(|(code, duration)| Fixation {
                    item: FixItem::from_code(code).unwrap(),
                    duration,
                })
                .collect(),
        }
    }

    #[test]
    fn bucket_caps_at_pool_count() {
        assert_eq!(fixation_bucket(1, 3), 1);
        assert_eq!(fixation_bucket(3, 3), 3);
        assert_eq!(fixation_bucket(7, 3), 3);
        assert_eq!(fixation_bucket(2, 0), 1);
    }

    #[test]
    fn value_diff_key_rounds_signed() {
        assert_eq!(value_diff_key(3.0, 0.0), 3);
        assert_eq!(value_diff_key(0.0, 3.0), -3);
        assert_eq!(value_diff_key(1.4, 0.0), 1);
        assert_eq!(value_diff_key(1.6, 0.0), 2);
    }

    #[test]
    fn estimate_pools_segments_by_role() {
        let trials = vec![
            trial(
                "s1",
                3.0,
                0.0,
                vec![(0, 200.0), (1, 300.0), (0, 100.0), (2, 400.0), (1, 500.0)],
            ),
            trial("s2", 1.0, 2.0, vec![(2, 600.0)]),
        ];

        let profile = estimate_profile(&trials, &[], 3).unwrap();
        let stats = profile.stats();

        // s1 contributes latency 200; s2 starts on an item, latency 0.
        assert_eq!(stats.n_latencies, 2);
        assert_eq!(stats.n_transitions, 1);
        // Only s1's first two item fixations survive (the rest are
        // decision-truncated final segments).
        assert_eq!(stats.n_fixation_samples, 2);
        assert!((stats.prob_fix_left_first - 0.5).abs() < 1e-12);

        let mut rng = StdRng::seed_from_u64(1);
        assert!((profile.sample_fixation(1, 3, &mut rng).unwrap() - 300.0).abs() < 1e-12);
        assert!((profile.sample_fixation(2, -3, &mut rng).unwrap() - 400.0).abs() < 1e-12);
    }

    #[test]
    fn estimate_honors_subject_filter() {
        let trials = vec![
            trial("s1", 3.0, 0.0, vec![(0, 200.0), (1, 300.0), (0, 50.0), (2, 400.0)]),
            trial("s2", 1.0, 2.0, vec![(0, 900.0), (2, 600.0), (0, 80.0), (1, 700.0)]),
        ];

        let profile = estimate_profile(&trials, &["s1".to_string()], 3).unwrap();
        let stats = profile.stats();
        assert_eq!(stats.n_latencies, 1);
        assert!((stats.prob_fix_left_first - 1.0).abs() < 1e-12);

        let mut rng = StdRng::seed_from_u64(1);
        assert!((profile.sample_latency(&mut rng) - 200.0).abs() < 1e-12);
    }

    #[test]
    fn missing_pool_is_a_sampling_failure() {
        let trials = vec![trial(
            "s1",
            3.0,
            0.0,
            vec![(0, 200.0), (1, 300.0), (0, 100.0), (2, 400.0), (1, 500.0)],
        )];
        let profile = estimate_profile(&trials, &[], 3).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        // Bucket 1 only holds the +3 key.
        let err = profile.sample_fixation(1, -3, &mut rng).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        // Order 5 caps to bucket 3, which holds nothing at all.
        let err = profile.sample_fixation(5, 3, &mut rng).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn estimate_requires_item_fixations() {
        let trials = vec![trial("s1", 3.0, 0.0, vec![(0, 200.0)])];
        let err = estimate_profile(&trials, &[], 3).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
