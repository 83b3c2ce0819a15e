//! Reporting utilities: run summaries and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the simulation/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{RecoveryConfig, TrialCondition};
use crate::fit::search::SearchOutcome;
use crate::io::ingest::{ExperimentData, RowError};
use crate::sim::profile::ProfileStats;

/// Format the full run summary (dataset stats + empirical profile + search setup).
pub fn format_run_summary(
    data: &ExperimentData,
    profile: &ProfileStats,
    conditions: &[TrialCondition],
    grid_size: usize,
    config: &RecoveryConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== addm - aDDM parameter recovery ===\n");
    out.push_str(&format!("Subjects: {}\n", fmt_subjects(&config.subject_ids)));
    out.push_str(&format!(
        "Data: trials={} | subjects={} | fixation rows={} | rt=[{:.0}, {:.0}]ms\n",
        data.stats.n_trials,
        data.stats.n_subjects,
        data.stats.n_fixation_rows,
        data.stats.rt_min,
        data.stats.rt_max
    ));
    out.push_str(&format!(
        "Profile: latencies={} | transitions={} | fixations={} | buckets={} | P(first fixation left)={:.3}\n",
        profile.n_latencies,
        profile.n_transitions,
        profile.n_fixation_samples,
        profile.n_buckets,
        profile.prob_fix_left_first
    ));
    out.push_str(&format!(
        "Conditions: {} | value levels {}\n",
        conditions.len(),
        fmt_vec(&config.value_levels)
    ));
    out.push_str(&format!(
        "Histogram: bin={:.0}ms | max={:.0}ms\n",
        config.bin_step, config.max_rt
    ));
    out.push_str(&format!("True model: {}\n", config.true_params.label()));
    out.push_str(&format!(
        "Grid: {grid_size} points | {} reference trials/condition | {} simulations/condition\n",
        config.num_trials, config.num_simulations
    ));
    out.push_str(&format!("Seed: {}\n", config.seed));
    out.push('\n');

    out
}

/// Format the per-point log-likelihood table plus the winner line.
pub fn format_grid_results(outcome: &SearchOutcome) -> String {
    let mut out = String::new();

    out.push_str("Grid log-likelihoods:\n");
    out.push_str(&format!(
        "  {:<9} {:<9} {:<7} {:>16}\n",
        "d", "sigma", "theta", "log-likelihood"
    ));
    for result in &outcome.results {
        let chosen = if result.index == outcome.best_index { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} {:<9.5} {:<9.5} {:<7.3} {:>16.6}\n",
            result.params.d, result.params.sigma, result.params.theta, result.log_likelihood
        ));
    }

    let best = outcome.best();
    out.push_str(&format!(
        "\nBest fit: {} (log-likelihood {:.6})\n",
        best.params.label(),
        best.log_likelihood
    ));

    out
}

/// Format row-level ingest issues, capped so a messy file cannot flood the terminal.
pub fn format_row_errors(errors: &[RowError], max_shown: usize) -> String {
    let mut out = String::new();
    if errors.is_empty() {
        return out;
    }

    out.push_str(&format!("Skipped rows ({}):\n", errors.len()));
    for err in errors.iter().take(max_shown) {
        match &err.subject {
            Some(subject) => {
                out.push_str(&format!("  line {} [{}]: {}\n", err.line, subject, err.message));
            }
            None => out.push_str(&format!("  line {}: {}\n", err.line, err.message)),
        }
    }
    if errors.len() > max_shown {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max_shown));
    }

    out
}

fn fmt_subjects(subject_ids: &[String]) -> String {
    if subject_ids.is_empty() {
        "all".to_string()
    } else {
        subject_ids.join(", ")
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x}")).collect();
    format!("[{}]", parts.join(", "))
}
