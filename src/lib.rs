//! `addm-fit` library crate.
//!
//! The binary (`addm`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - simulation and fitting stay reusable (e.g., batch drivers, notebooks)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod sim;
