//! # Workflows Module
//!
//! High-level entry points that tie the engine and core layers together.
//!
//! - **Configuration generator** ([`generator`]) - Owns the surrogate model, the reference
//!   geometry, the key mapping and the scoring function, and runs the
//!   recommend → convert → score → update loop either one step at a time or for a fixed
//!   number of steps with progress reporting.

pub mod generator;

pub use generator::{ConfigurationGenerator, StepOutcome};
