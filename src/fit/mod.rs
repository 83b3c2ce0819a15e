//! Model fitting orchestration.
//!
//! Responsibilities:
//!
//! - enumerate the (d, sigma, theta) candidate grid
//! - simulate the reference histograms for the true model
//! - score candidates via choice-conditioned RT histograms
//! - run the parallel grid search and pick the winner

pub mod grid;
pub mod likelihood;
pub mod reference;
pub mod search;

pub use grid::*;
pub use likelihood::*;
pub use reference::*;
pub use search::*;
