//! # Core Module
//!
//! The foundation layer: observation data structures, the key mapping that keeps caller and
//! model key-spaces consistent, and the contracts the search loop consumes from its external
//! collaborators.
//!
//! ## Architecture
//!
//! - **Observations** ([`observations`]) - Coordinate keys and ordered observation sets, with CSV I/O
//! - **Key Mapping** ([`mapping`]) - Validation of initial observations and the canonical key bijection
//! - **Geometry** ([`geometry`]) - The reference-geometry displacement contract
//! - **Conformers** ([`conformers`]) - Embedding options and the conformer-ensemble contract

pub mod conformers;
pub mod geometry;
pub mod mapping;
pub mod observations;

/// A type-erased error raised by an external collaborator (model, geometry, scoring function).
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;
