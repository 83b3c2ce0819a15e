//! Terminal plotting (ASCII histogram panels).

pub mod ascii;

pub use ascii::*;
