//! Mathematical utilities: reaction-time histogram binning and mass helpers.

pub mod histogram;

pub use histogram::*;
