//! Shared pipeline logic behind the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> profile estimation -> reference simulation -> grid search
//!
//! The CLI then focuses on presentation (printing and exports).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;

use crate::domain::{
    RecoveryConfig, SimulateConfig, SimulatedTrial, TrialCondition, build_conditions,
};
use crate::error::AppError;
use crate::fit::reference::ReferenceData;
use crate::fit::search::SearchOutcome;
use crate::io::ingest::ExperimentData;
use crate::sim::profile::{FixationProfile, ProfileStats};

/// All computed outputs of a single `addm recover` run.
#[derive(Debug, Clone)]
pub struct RecoveryOutput {
    pub data: ExperimentData,
    pub profile: FixationProfile,
    pub profile_stats: ProfileStats,
    pub conditions: Vec<TrialCondition>,
    pub edges: Vec<f64>,
    pub reference: ReferenceData,
    pub outcome: SearchOutcome,
    /// RT histograms freshly simulated under the winning parameters.
    pub best_sim: ReferenceData,
}

/// Execute the full recovery pipeline and return the computed outputs.
pub fn run_recovery(config: &RecoveryConfig) -> Result<RecoveryOutput, AppError> {
    // 1) Load the experimental CSVs.
    let data =
        crate::io::ingest::load_experiment_csv(&config.expdata_path, &config.fixations_path)?;

    // 2) Estimate the empirical fixation profile.
    let profile = crate::sim::profile::estimate_profile(
        &data.trials,
        &config.subject_ids,
        config.sim.num_fix_buckets,
    )?;
    let profile_stats = profile.stats();

    // 3) Build the condition set and the histogram support.
    let conditions = build_conditions(&config.value_levels)?;
    let edges = crate::math::rt_bin_edges(config.bin_step, config.max_rt)?;

    // 4) Simulate the reference dataset under the ground-truth parameters.
    let reference = crate::fit::reference::generate_reference(
        &config.true_params,
        &profile,
        &conditions,
        config.num_trials,
        &edges,
        &config.sim,
        derive_seed("reference", config.seed),
    )?;

    // 5) Enumerate the grid and search it in parallel.
    let grid = crate::fit::grid::enumerate_grid(
        &config.range_d,
        &config.range_sigma,
        &config.range_theta,
    )?;
    crate::fit::search::install_thread_pool(config.num_threads);
    let outcome = crate::fit::search::grid_search(
        &grid,
        &profile,
        &conditions,
        config.num_simulations,
        &reference,
        &config.sim,
        derive_seed("search", config.seed),
    )?;

    // 6) Re-simulate the winner once so reports can show data vs model.
    let best_sim = crate::fit::reference::generate_reference(
        &outcome.best().params,
        &profile,
        &conditions,
        config.num_trials,
        &edges,
        &config.sim,
        derive_seed("best", config.seed),
    )?;

    Ok(RecoveryOutput {
        data,
        profile,
        profile_stats,
        conditions,
        edges,
        reference,
        outcome,
        best_sim,
    })
}

/// All computed outputs of a single `addm simulate` run.
#[derive(Debug, Clone)]
pub struct SimulateOutput {
    pub data: ExperimentData,
    pub profile_stats: ProfileStats,
    pub conditions: Vec<TrialCondition>,
    pub trials: Vec<SimulatedTrial>,
}

/// Simulate trials for every condition under fixed parameters.
pub fn run_simulate(config: &SimulateConfig) -> Result<SimulateOutput, AppError> {
    // 1) Load the CSVs and estimate the profile, exactly as for recovery.
    let data =
        crate::io::ingest::load_experiment_csv(&config.expdata_path, &config.fixations_path)?;
    let profile = crate::sim::profile::estimate_profile(
        &data.trials,
        &config.subject_ids,
        config.sim.num_fix_buckets,
    )?;
    let profile_stats = profile.stats();

    // 2) Build the condition set.
    let conditions = build_conditions(&config.value_levels)?;

    // 3) Simulate trials condition by condition from one seeded stream.
    let mut rng = StdRng::seed_from_u64(derive_seed("simulate", config.seed));
    let mut trials = Vec::with_capacity(conditions.len() * config.num_trials);
    for condition in &conditions {
        for trial in 0..config.num_trials {
            let simulated = crate::sim::trial::simulate_trial(
                &config.params,
                condition.value_left,
                condition.value_right,
                &profile,
                &config.sim,
                &mut rng,
            )
            .map_err(|e| {
                e.with_context(format!(
                    "Trial {trial} for condition {}",
                    condition.label()
                ))
            })?;
            trials.push(simulated);
        }
    }

    Ok(SimulateOutput {
        data,
        profile_stats,
        conditions,
        trials,
    })
}

/// Derive an independent seed stream from the user-facing seed.
fn derive_seed(stream: &str, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    stream.hash(&mut hasher);
    seed.hash(&mut hasher);
    hasher.finish()
}
