//! Sandfield - a scrolling field of excavatable sand particles

pub mod core;
pub mod math;
pub mod terrain;
pub mod physics;
pub mod sand;
pub mod spawn;
pub mod excavation;
pub mod simulation;
