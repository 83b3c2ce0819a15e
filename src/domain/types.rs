//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - used in-memory during simulation and fitting
//! - exported to JSON/CSV
//! - reloaded later for comparisons across runs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which item the gaze rests on during one segment of a trial.
///
/// `None` covers the pre-trial latency and the transitions between item
/// fixations. Tabular datasets code this column as `0` = none, `1` = left,
/// `2` = right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixItem {
    None,
    Left,
    Right,
}

impl FixItem {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(FixItem::None),
            1 => Some(FixItem::Left),
            2 => Some(FixItem::Right),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            FixItem::None => 0,
            FixItem::Left => 1,
            FixItem::Right => 2,
        }
    }

    /// The opposite item. `None` has no opposite and maps to itself.
    pub fn other(self) -> Self {
        match self {
            FixItem::None => FixItem::None,
            FixItem::Left => FixItem::Right,
            FixItem::Right => FixItem::Left,
        }
    }
}

/// Trial outcome.
///
/// The accumulator treats the upper barrier as evidence for the left item,
/// so a crossing at `+barrier` records a left choice and a crossing at
/// `-barrier` a right choice. Tabular datasets code the column as `-1` =
/// left, `1` = right, `0` = undecided (e.g. timeout trials).
///
/// The simulator never returns `Undecided`; the variant exists for loaded
/// data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Left,
    Right,
    Undecided,
}

impl Choice {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Choice::Left),
            1 => Some(Choice::Right),
            0 => Some(Choice::Undecided),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Choice::Left => -1,
            Choice::Right => 1,
            Choice::Undecided => 0,
        }
    }
}

/// aDDM parameters identifying one point in the search space.
///
/// - `d`: drift scaling per time tick (must be > 0)
/// - `sigma`: standard deviation of the per-tick Gaussian noise (> 0)
/// - `theta`: attentional discount applied to the unfixated item
/// - `barrier`: decision threshold magnitude (> 0, symmetric around 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddmParams {
    pub d: f64,
    pub sigma: f64,
    pub theta: f64,
    pub barrier: f64,
}

impl AddmParams {
    /// Construct with the conventional unit barrier.
    pub fn new(d: f64, sigma: f64, theta: f64) -> Self {
        Self {
            d,
            sigma,
            theta,
            barrier: 1.0,
        }
    }

    pub fn with_barrier(d: f64, sigma: f64, theta: f64, barrier: f64) -> Self {
        Self {
            d,
            sigma,
            theta,
            barrier,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.d.is_finite() && self.d > 0.0) {
            return Err(AppError::new(2, format!("Invalid d: {} (must be finite and > 0).", self.d)));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid sigma: {} (must be finite and > 0).", self.sigma),
            ));
        }
        if !self.theta.is_finite() {
            return Err(AppError::new(2, format!("Invalid theta: {} (must be finite).", self.theta)));
        }
        if !(self.barrier.is_finite() && self.barrier > 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid barrier: {} (must be finite and > 0).", self.barrier),
            ));
        }
        Ok(())
    }

    /// Short label for terminal output and error context.
    pub fn label(&self) -> String {
        format!("d={:.5} sigma={:.5} theta={:.3}", self.d, self.sigma, self.theta)
    }
}

/// One gaze segment of a simulated trial: the item fixated, how long the
/// segment lasted (ms), and the accumulator value at segment end.
#[derive(Debug, Clone, Copy)]
pub struct FixSegment {
    pub item: FixItem,
    pub duration: f64,
    pub rdv: f64,
}

/// A simulated trial record.
///
/// `rt` is the total trial time in ms, including latency and any motor
/// delay. The segment trace is retained even though likelihood scoring only
/// consumes `rt` and `choice`.
#[derive(Debug, Clone)]
pub struct SimulatedTrial {
    pub rt: f64,
    pub choice: Choice,
    pub value_left: f64,
    pub value_right: f64,
    pub segments: Vec<FixSegment>,
}

/// One gaze record of a loaded experimental trial.
#[derive(Debug, Clone, Copy)]
pub struct Fixation {
    pub item: FixItem,
    pub duration: f64,
}

/// A loaded experimental trial with its ordered gaze sequence.
#[derive(Debug, Clone)]
pub struct ExperimentTrial {
    pub subject: String,
    pub trial: u64,
    pub rt: f64,
    pub choice: Choice,
    pub value_left: f64,
    pub value_right: f64,
    pub fixations: Vec<Fixation>,
}

/// A pair of item values under which real and simulated trials are
/// aggregated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialCondition {
    pub value_left: f64,
    pub value_right: f64,
}

impl TrialCondition {
    pub fn label(&self) -> String {
        format!("({:.1}, {:.1})", self.value_left, self.value_right)
    }
}

/// Build the condition set from a list of item value levels: every ordered
/// pair of distinct values, in enumeration order, deduplicated.
pub fn build_conditions(value_levels: &[f64]) -> Result<Vec<TrialCondition>, AppError> {
    if value_levels.is_empty() {
        return Err(AppError::new(2, "Value levels must not be empty."));
    }
    if let Some(v) = value_levels.iter().find(|v| !v.is_finite()) {
        return Err(AppError::new(2, format!("Invalid value level: {v} (must be finite).")));
    }

    let mut out: Vec<TrialCondition> = Vec::new();
    for &left in value_levels {
        for &right in value_levels {
            if left == right {
                continue;
            }
            let cond = TrialCondition {
                value_left: left,
                value_right: right,
            };
            if !out.contains(&cond) {
                out.push(cond);
            }
        }
    }

    if out.is_empty() {
        return Err(AppError::new(
            2,
            "Value levels must contain at least two distinct values.",
        ));
    }
    Ok(out)
}

/// Simulation knobs shared by every simulator call.
#[derive(Debug, Clone, Copy)]
pub struct SimOptions {
    /// Accumulator tick length (ms).
    pub time_step: f64,
    /// Number of fixation-order pools; fixations beyond this order reuse the
    /// last pool.
    pub num_fix_buckets: usize,
    /// Carried in the options for datasets that quote it, but not applied to
    /// segment timing.
    pub visual_delay: f64,
    /// Added to the terminal segment once a barrier is crossed (ms).
    pub motor_delay: f64,
    /// Cap on latency-phase resampling after barrier contact. `None` retries
    /// indefinitely.
    pub max_latency_resamples: Option<u32>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            time_step: 10.0,
            num_fix_buckets: 3,
            visual_delay: 0.0,
            motor_delay: 0.0,
            max_latency_resamples: None,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid time step: {} (must be finite and > 0).", self.time_step),
            ));
        }
        if self.num_fix_buckets == 0 {
            return Err(AppError::new(2, "Number of fixation buckets must be >= 1."));
        }
        if !(self.visual_delay.is_finite() && self.visual_delay >= 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid visual delay: {} (must be finite and >= 0).", self.visual_delay),
            ));
        }
        if !(self.motor_delay.is_finite() && self.motor_delay >= 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid motor delay: {} (must be finite and >= 0).", self.motor_delay),
            ));
        }
        Ok(())
    }
}

/// A full recovery run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub expdata_path: PathBuf,
    pub fixations_path: PathBuf,
    /// Restrict profile estimation to these subjects (empty = all).
    pub subject_ids: Vec<String>,

    /// Generating parameters for the reference dataset.
    pub true_params: AddmParams,
    pub range_d: Vec<f64>,
    pub range_sigma: Vec<f64>,
    pub range_theta: Vec<f64>,

    /// Item value levels the condition set is built from.
    pub value_levels: Vec<f64>,
    /// Reference trials per condition.
    pub num_trials: usize,
    /// Simulations per condition per grid point.
    pub num_simulations: usize,

    pub bin_step: f64,
    pub max_rt: f64,
    pub sim: SimOptions,

    /// Worker pool size for the grid search (0 = automatic).
    pub num_threads: usize,
    pub seed: u64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,

    pub verbose: bool,
}

/// Configuration for the `simulate` subcommand.
#[derive(Debug, Clone)]
pub struct SimulateConfig {
    pub expdata_path: PathBuf,
    pub fixations_path: PathBuf,
    pub subject_ids: Vec<String>,

    pub params: AddmParams,
    pub value_levels: Vec<f64>,
    /// Simulated trials per condition.
    pub num_trials: usize,
    pub sim: SimOptions,
    pub seed: u64,

    pub out_trials: PathBuf,
    pub out_fixations: PathBuf,

    pub verbose: bool,
}

/// A saved best-fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated_at: String,
    pub true_params: AddmParams,
    pub best_params: AddmParams,
    pub log_likelihood: f64,
    pub grid_size: usize,
    pub n_conditions: usize,
    pub num_trials: usize,
    pub num_simulations: usize,
    pub bin_step: f64,
    pub max_rt: f64,
    pub seed: u64,
}
