//! Trial simulation.
//!
//! Responsibilities:
//!
//! - hold the empirical fixation profile sampled during simulation (`profile`)
//! - walk the evidence accumulator through one trial (`trial`)

pub mod profile;
pub mod trial;

pub use profile::*;
pub use trial::*;
