//! # conflib Core Library
//!
//! A library for model-guided search over a molecule's configuration space. A pluggable
//! surrogate model proposes coordinate samples, those samples become concrete configurations
//! through a reference geometry, an external scoring function evaluates them, and the scores
//! are fed back to the model before the next proposal.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ObservationKey`, `ObservationSet`),
//!   the key mapping between caller coordinates and canonical model keys, and the contracts of
//!   the external collaborators (`GeometryService`, `ConformerEmbedder`).
//!
//! - **[`engine`]: The Logic Core.** Configuration, error types, the configuration converter,
//!   the surrogate model contract and adapter, the search history, and progress reporting.
//!
//! - **[`workflows`]: The Public API.** The [`workflows::generator::ConfigurationGenerator`]
//!   ties the engine and core together into the recommend → convert → score → update loop.

pub mod core;
pub mod engine;
pub mod workflows;
