//! Stochastic trial generation for the attentional drift-diffusion model.
//!
//! A trial walks a relative decision value (RDV) on a fixed tick grid until
//! it is absorbed at one of two barriers. Attention gates the drift: during
//! item fixations the RDV drifts toward the fixated item's value (discounted
//! by theta for the unfixated item) plus Gaussian noise, while latencies and
//! transitions contribute noise only. Fixation behavior is resampled from an
//! empirical [`FixationProfile`] rather than modeled parametrically.

use rand::prelude::*;
use rand_distr::Normal;

use crate::domain::{AddmParams, Choice, FixItem, FixSegment, SimOptions, SimulatedTrial};
use crate::error::AppError;
use crate::sim::profile::{FixationProfile, fixation_bucket, value_diff_key};

/// Generate one simulated trial for a pair of item values.
///
/// The walk has three phases. A latency phase accumulates noise before the
/// first fixation; hitting a barrier there discards the phase and resamples
/// it, so a trial can never end before an item has been looked at. Item
/// fixations then alternate with transitions until the RDV is absorbed.
/// Barrier checks run at the top of each fixation tick, so a crossing left
/// over by a zero-tick transition is charged to the next fixation.
pub fn simulate_trial(
    params: &AddmParams,
    value_left: f64,
    value_right: f64,
    profile: &FixationProfile,
    opts: &SimOptions,
    rng: &mut StdRng,
) -> Result<SimulatedTrial, AppError> {
    params.validate()?;
    opts.validate()?;

    let noise = Normal::new(0.0, params.sigma)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let time_step = opts.time_step;

    let mut rdv = 0.0;
    let mut elapsed = 0.0;
    let mut segments: Vec<FixSegment> = Vec::new();

    // Latency phase. The RDV may wander but must not be absorbed; an
    // absorbed attempt is thrown away wholesale and the phase restarts.
    let mut attempts = 0u32;
    loop {
        let latency = profile.sample_latency(rng);
        let mut absorbed_early = false;
        for _ in 0..tick_count(latency, time_step) {
            rdv += noise.sample(rng);
            if absorbed(rdv, params.barrier).is_some() {
                absorbed_early = true;
                break;
            }
        }
        if absorbed_early {
            rdv = 0.0;
            attempts += 1;
            if let Some(cap) = opts.max_latency_resamples {
                if attempts > cap {
                    return Err(AppError::new(
                        4,
                        format!("Latency phase was absorbed {attempts} times; resample cap exceeded."),
                    ));
                }
            }
            continue;
        }
        let recorded = floor_to_step(latency, time_step);
        segments.push(FixSegment {
            item: FixItem::None,
            duration: recorded,
            rdv,
        });
        elapsed += recorded;
        break;
    }

    // First fixation target and duration.
    let mut item = if rng.r#gen::<f64>() < profile.prob_fix_left_first() {
        FixItem::Left
    } else {
        FixItem::Right
    };
    let mut fix_number = 1usize;
    let mut duration =
        profile.sample_fixation(fix_number, diff_key_for(item, value_left, value_right), rng)?;

    loop {
        // Item fixation: check for absorption at the top of each tick, then
        // integrate drift plus noise.
        for t in 0..tick_count(duration, time_step) {
            if let Some(choice) = absorbed(rdv, params.barrier) {
                let terminal = (t + 1) as f64 * time_step + opts.motor_delay;
                segments.push(FixSegment {
                    item,
                    duration: terminal,
                    rdv,
                });
                elapsed += terminal;
                return Ok(SimulatedTrial {
                    rt: elapsed,
                    choice,
                    value_left,
                    value_right,
                    segments,
                });
            }
            rdv += drift(params, item, value_left, value_right) + noise.sample(rng);
        }

        let recorded = floor_to_step(duration, time_step);
        segments.push(FixSegment {
            item,
            duration: recorded,
            rdv,
        });
        elapsed += recorded;

        // Transition: noise only, absorption checked after each increment.
        // A transition that runs out without absorbing leaves no segment and
        // does not advance the clock.
        let transition = profile.sample_transition(rng);
        for t in 0..tick_count(transition, time_step) {
            rdv += noise.sample(rng);
            if let Some(choice) = absorbed(rdv, params.barrier) {
                let terminal = (t + 1) as f64 * time_step + opts.motor_delay;
                segments.push(FixSegment {
                    item: FixItem::None,
                    duration: terminal,
                    rdv,
                });
                elapsed += terminal;
                return Ok(SimulatedTrial {
                    rt: elapsed,
                    choice,
                    value_left,
                    value_right,
                    segments,
                });
            }
        }

        item = item.other();
        fix_number += 1;
        let bucket = fixation_bucket(fix_number, opts.num_fix_buckets);
        duration =
            profile.sample_fixation(bucket, diff_key_for(item, value_left, value_right), rng)?;
    }
}

fn tick_count(duration: f64, time_step: f64) -> u64 {
    (duration / time_step).floor().max(0.0) as u64
}

fn floor_to_step(duration: f64, time_step: f64) -> f64 {
    duration - duration % time_step
}

/// Inclusive absorption check. The upper barrier maps to a left choice.
fn absorbed(rdv: f64, barrier: f64) -> Option<Choice> {
    if rdv >= barrier {
        Some(Choice::Left)
    } else if rdv <= -barrier {
        Some(Choice::Right)
    } else {
        None
    }
}

fn drift(params: &AddmParams, item: FixItem, value_left: f64, value_right: f64) -> f64 {
    match item {
        FixItem::Left => params.d * (value_left - params.theta * value_right),
        FixItem::Right => params.d * (-value_right + params.theta * value_left),
        FixItem::None => 0.0,
    }
}

fn diff_key_for(item: FixItem, value_left: f64, value_right: f64) -> i64 {
    match item {
        FixItem::Right => value_diff_key(value_right, value_left),
        _ => value_diff_key(value_left, value_right),
    }
}
