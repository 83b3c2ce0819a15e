//! Command-line parsing for the aDDM fitting tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the simulation/fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "addm", version, about = "Attentional DDM simulator and grid-search fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate the empirical fixation profile, simulate a reference dataset,
    /// and recover the generating parameters over a grid.
    Recover(RecoverArgs),
    /// Simulate trials under fixed parameters and write them as CSV.
    Simulate(SimulateArgs),
}

/// Options for parameter recovery.
#[derive(Debug, Parser, Clone)]
pub struct RecoverArgs {
    /// Trial-level CSV (parcode, trial, rt, choice, item_left, item_right).
    #[arg(long, default_value = "expdata.csv")]
    pub expdata_file: PathBuf,

    /// Fixation-level CSV (parcode, trial, fix_item, fix_time).
    #[arg(long, default_value = "fixations.csv")]
    pub fixations_file: PathBuf,

    /// Restrict the empirical profile to these subjects (default: all).
    #[arg(long, num_args = 1..)]
    pub subject_ids: Vec<String>,

    /// Drift scaling of the generating model.
    #[arg(long, default_value_t = 0.006)]
    pub d: f64,

    /// Noise standard deviation per time step of the generating model.
    #[arg(long, default_value_t = 0.08)]
    pub sigma: f64,

    /// Attentional discount on the unfixated item (0 = ignored, 1 = no discount).
    #[arg(long, default_value_t = 0.5)]
    pub theta: f64,

    /// Candidate d values for the grid.
    #[arg(long, num_args = 1.., default_values_t = [0.005, 0.006, 0.007])]
    pub range_d: Vec<f64>,

    /// Candidate sigma values for the grid.
    #[arg(long, num_args = 1.., default_values_t = [0.065, 0.08, 0.095])]
    pub range_sigma: Vec<f64>,

    /// Candidate theta values for the grid.
    #[arg(long, num_args = 1.., default_values_t = [0.4, 0.5, 0.6])]
    pub range_theta: Vec<f64>,

    /// Item value levels the condition set is built from.
    #[arg(long, num_args = 1.., default_values_t = [0.0, 1.0, 2.0, 3.0])]
    pub value_levels: Vec<f64>,

    /// Reference trials per condition.
    #[arg(long, default_value_t = 10)]
    pub num_trials: usize,

    /// Simulations per condition per grid point.
    #[arg(long, default_value_t = 10)]
    pub num_simulations: usize,

    /// RT histogram bin width (ms).
    #[arg(long, default_value_t = 100.0)]
    pub bin_step: f64,

    /// RT histogram upper edge (ms).
    #[arg(long, default_value_t = 8000.0)]
    pub max_rt: f64,

    /// Simulation tick (ms).
    #[arg(long, default_value_t = 10.0)]
    pub time_step: f64,

    /// Fixation duration pools: first, second, then all later fixations.
    #[arg(long, default_value_t = 3)]
    pub num_fix_buckets: usize,

    /// Motor response delay appended to the deciding fixation (ms).
    #[arg(long, default_value_t = 0.0)]
    pub motor_delay: f64,

    /// Visual onset delay (ms).
    #[arg(long, default_value_t = 0.0)]
    pub visual_delay: f64,

    /// Worker threads for the grid search (0 = automatic).
    #[arg(long, default_value_t = 0)]
    pub num_threads: usize,

    /// Random seed (reference dataset and grid points derive from it).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Render ASCII RT histograms in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export per-grid-point log-likelihoods to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the winning fit (parameters + run settings) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_fit: Option<PathBuf>,

    /// Print skipped-row details during ingest.
    #[arg(long)]
    pub verbose: bool,
}

/// Options for standalone simulation.
#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Trial-level CSV the empirical profile is estimated from.
    #[arg(long, default_value = "expdata.csv")]
    pub expdata_file: PathBuf,

    /// Fixation-level CSV the empirical profile is estimated from.
    #[arg(long, default_value = "fixations.csv")]
    pub fixations_file: PathBuf,

    /// Restrict the empirical profile to these subjects (default: all).
    #[arg(long, num_args = 1..)]
    pub subject_ids: Vec<String>,

    /// Drift scaling.
    #[arg(long, default_value_t = 0.006)]
    pub d: f64,

    /// Noise standard deviation per time step.
    #[arg(long, default_value_t = 0.08)]
    pub sigma: f64,

    /// Attentional discount on the unfixated item.
    #[arg(long, default_value_t = 0.5)]
    pub theta: f64,

    /// Item value levels the condition set is built from.
    #[arg(long, num_args = 1.., default_values_t = [0.0, 1.0, 2.0, 3.0])]
    pub value_levels: Vec<f64>,

    /// Trials to simulate per condition.
    #[arg(long, default_value_t = 10)]
    pub num_trials: usize,

    /// Simulation tick (ms).
    #[arg(long, default_value_t = 10.0)]
    pub time_step: f64,

    /// Fixation duration pools: first, second, then all later fixations.
    #[arg(long, default_value_t = 3)]
    pub num_fix_buckets: usize,

    /// Motor response delay appended to the deciding fixation (ms).
    #[arg(long, default_value_t = 0.0)]
    pub motor_delay: f64,

    /// Visual onset delay (ms).
    #[arg(long, default_value_t = 0.0)]
    pub visual_delay: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV for simulated trials.
    #[arg(long, default_value = "simulated_expdata.csv")]
    pub out_trials: PathBuf,

    /// Output CSV for simulated fixations.
    #[arg(long, default_value = "simulated_fixations.csv")]
    pub out_fixations: PathBuf,

    /// Print skipped-row details during ingest.
    #[arg(long)]
    pub verbose: bool,
}
