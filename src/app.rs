//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the experimental CSVs and estimates the fixation profile
//! - simulates the reference dataset and runs the grid search
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, RecoverArgs, SimulateArgs};
use crate::domain::{AddmParams, RecoveryConfig, SimOptions, SimulateConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `addm` binary.
pub fn run() -> Result<(), AppError> {
    // We want `addm` and `addm --seed 7` to behave like `addm recover ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Recover(args) => handle_recover(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_recover(args: RecoverArgs) -> Result<(), AppError> {
    let config = recovery_config_from_args(&args);
    let run = pipeline::run_recovery(&config)?;

    // Print terminal output.
    println!(
        "{}",
        crate::report::format_run_summary(
            &run.data,
            &run.profile_stats,
            &run.conditions,
            run.outcome.results.len(),
            &config,
        )
    );
    if config.verbose {
        let issues = crate::report::format_row_errors(&run.data.row_errors, 20);
        if !issues.is_empty() {
            println!("{issues}");
        }
    }
    println!("{}", crate::report::format_grid_results(&run.outcome));

    if config.plot {
        let plot = crate::plot::render_rt_panels(
            &run.edges,
            &run.reference.totals(),
            &run.best_sim.totals(),
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_grid_csv(path, &run.outcome)?;
    }
    if let Some(path) = &config.export_fit {
        crate::io::export::write_fit_json(path, &config, &run.outcome, run.conditions.len())?;
    }

    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = simulate_config_from_args(&args);
    let run = pipeline::run_simulate(&config)?;

    crate::io::export::write_simulated_trials_csv(&config.out_trials, &run.trials)?;
    crate::io::export::write_simulated_fixations_csv(&config.out_fixations, &run.trials)?;

    if config.verbose {
        let issues = crate::report::format_row_errors(&run.data.row_errors, 20);
        if !issues.is_empty() {
            println!("{issues}");
        }
    }
    println!(
        "Simulated {} trials over {} conditions ({}) -> {}, {}",
        run.trials.len(),
        run.conditions.len(),
        config.params.label(),
        config.out_trials.display(),
        config.out_fixations.display()
    );

    Ok(())
}

pub fn recovery_config_from_args(args: &RecoverArgs) -> RecoveryConfig {
    RecoveryConfig {
        expdata_path: args.expdata_file.clone(),
        fixations_path: args.fixations_file.clone(),
        subject_ids: args.subject_ids.clone(),
        true_params: AddmParams::new(args.d, args.sigma, args.theta),
        range_d: args.range_d.clone(),
        range_sigma: args.range_sigma.clone(),
        range_theta: args.range_theta.clone(),
        value_levels: args.value_levels.clone(),
        num_trials: args.num_trials,
        num_simulations: args.num_simulations,
        bin_step: args.bin_step,
        max_rt: args.max_rt,
        sim: sim_options_from_args(
            args.time_step,
            args.num_fix_buckets,
            args.visual_delay,
            args.motor_delay,
        ),
        num_threads: args.num_threads,
        seed: args.seed,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_fit: args.export_fit.clone(),
        verbose: args.verbose,
    }
}

pub fn simulate_config_from_args(args: &SimulateArgs) -> SimulateConfig {
    SimulateConfig {
        expdata_path: args.expdata_file.clone(),
        fixations_path: args.fixations_file.clone(),
        subject_ids: args.subject_ids.clone(),
        params: AddmParams::new(args.d, args.sigma, args.theta),
        value_levels: args.value_levels.clone(),
        num_trials: args.num_trials,
        sim: sim_options_from_args(
            args.time_step,
            args.num_fix_buckets,
            args.visual_delay,
            args.motor_delay,
        ),
        seed: args.seed,
        out_trials: args.out_trials.clone(),
        out_fixations: args.out_fixations.clone(),
        verbose: args.verbose,
    }
}

fn sim_options_from_args(
    time_step: f64,
    num_fix_buckets: usize,
    visual_delay: f64,
    motor_delay: f64,
) -> SimOptions {
    SimOptions {
        time_step,
        num_fix_buckets,
        visual_delay,
        motor_delay,
        ..SimOptions::default()
    }
}

/// Rewrite argv so `addm` defaults to `addm recover`.
///
/// Rules:
/// - `addm`                      -> `addm recover`
/// - `addm --seed 7 ...`         -> `addm recover --seed 7 ...`
/// - `addm --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("recover".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "recover" | "simulate");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "recover flags".
    if arg1.starts_with('-') {
        argv.insert(1, "recover".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
