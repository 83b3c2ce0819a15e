//! Terminal reporting: run summaries, grid tables, row-error digests.

pub mod format;

pub use format::*;
