//! Result exports.
//!
//! Grid scores go to CSV for spreadsheets and downstream scripts; the best
//! fit goes to a small JSON document (`domain::FitFile`) that records enough
//! run metadata to reproduce it. The `simulate` subcommand writes its trials
//! in the same tabular schema the loader reads, so simulated data can be fed
//! straight back in.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;

use crate::domain::{FitFile, RecoveryConfig, SimulatedTrial};
use crate::error::AppError;
use crate::fit::{GridPointResult, SearchOutcome};

/// Subject id stamped on simulated rows.
const SIM_PARCODE: &str = "sim";

/// Write one row per grid point, flagging the winner.
pub fn write_grid_csv(path: &Path, outcome: &SearchOutcome) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create grid CSV '{}': {e}", path.display()),
        )
    })?;

    writeln!(file, "d,sigma,theta,log_likelihood,best")
        .map_err(|e| AppError::new(2, format!("Failed to write grid CSV header: {e}")))?;

    for (i, result) in outcome.results.iter().enumerate() {
        writeln!(file, "{}", grid_csv_row(result, i == outcome.best_index))
            .map_err(|e| AppError::new(2, format!("Failed to write grid CSV row: {e}")))?;
    }

    Ok(())
}

fn grid_csv_row(result: &GridPointResult, best: bool) -> String {
    format!(
        "{:.5},{:.5},{:.3},{:.6},{}",
        result.params.d,
        result.params.sigma,
        result.params.theta,
        result.log_likelihood,
        u8::from(best)
    )
}

/// Write the best-fit JSON document.
pub fn write_fit_json(
    path: &Path,
    config: &RecoveryConfig,
    outcome: &SearchOutcome,
    n_conditions: usize,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create fit JSON '{}': {e}", path.display()),
        )
    })?;

    let best = outcome.best();
    let fit = FitFile {
        tool: "addm".to_string(),
        generated_at: Local::now().to_rfc3339(),
        true_params: config.true_params,
        best_params: best.params,
        log_likelihood: best.log_likelihood,
        grid_size: outcome.results.len(),
        n_conditions,
        num_trials: config.num_trials,
        num_simulations: config.num_simulations,
        bin_step: config.bin_step,
        max_rt: config.max_rt,
        seed: config.seed,
    };

    serde_json::to_writer_pretty(file, &fit)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;

    Ok(())
}

/// Write simulated trials in the loader's trial schema.
pub fn write_simulated_trials_csv(path: &Path, trials: &[SimulatedTrial]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create trial CSV '{}': {e}", path.display()),
        )
    })?;

    writeln!(file, "parcode,trial,rt,choice,item_left,item_right")
        .map_err(|e| AppError::new(2, format!("Failed to write trial CSV header: {e}")))?;

    for (i, trial) in trials.iter().enumerate() {
        writeln!(file, "{}", simulated_trial_row((i + 1) as u64, trial))
            .map_err(|e| AppError::new(2, format!("Failed to write trial CSV row: {e}")))?;
    }

    Ok(())
}

fn simulated_trial_row(number: u64, trial: &SimulatedTrial) -> String {
    format!(
        "{SIM_PARCODE},{number},{},{},{},{}",
        trial.rt,
        trial.choice.code(),
        trial.value_left,
        trial.value_right
    )
}

/// Write simulated gaze segments in the loader's fixation schema.
///
/// Trial numbering matches `write_simulated_trials_csv` so the two files
/// join back together.
pub fn write_simulated_fixations_csv(
    path: &Path,
    trials: &[SimulatedTrial],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create fixation CSV '{}': {e}", path.display()),
        )
    })?;

    writeln!(file, "parcode,trial,fix_item,fix_time")
        .map_err(|e| AppError::new(2, format!("Failed to write fixation CSV header: {e}")))?;

    for (i, trial) in trials.iter().enumerate() {
        for row in simulated_fixation_rows((i + 1) as u64, trial) {
            writeln!(file, "{row}")
                .map_err(|e| AppError::new(2, format!("Failed to write fixation CSV row: {e}")))?;
        }
    }

    Ok(())
}

fn simulated_fixation_rows(number: u64, trial: &SimulatedTrial) -> Vec<String> {
    trial
        .segments
        .iter()
        .map(|segment| {
            format!(
                "{SIM_PARCODE},{number},{},{}",
                segment.item.code(),
                segment.duration
            )
        })
        .collect()
}
