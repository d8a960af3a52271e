//! Background processing.

mod simulation;

pub use simulation::*;
