//! Domain models for the hospital records core.

mod patient;
mod statistics;

pub use patient::*;
pub use statistics::*;
