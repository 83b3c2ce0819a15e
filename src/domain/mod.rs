//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - model parameters (`AddmParams`) and trial conditions (`TrialCondition`)
//! - trial records, simulated (`SimulatedTrial`) and loaded (`ExperimentTrial`)
//! - simulation knobs (`SimOptions`) and run configuration (`RecoveryConfig`)

pub mod types;

pub use types::*;
