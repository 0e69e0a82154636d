//! Airplane Boarding Simulation Library
//!
//! A grid-based boarding simulation for comparing boarding policies.

pub mod simulation;
pub mod stats;
