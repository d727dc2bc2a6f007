//! # Engine Module
//!
//! The logic layer of conflib: everything the generator loop needs between "the model
//! proposed some samples" and "the model was told their scores".
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Configuration modes and generator settings, with TOML loading
//! - **Conversion** ([`convert`]) - Mode dispatch turning coordinate samples into configurations
//! - **Surrogate Models** ([`model`]) - The model capability contract, model sources and the adapter
//! - **Scoring** ([`scoring`]) - The scoring-function contract
//! - **History** ([`history`]) - Record of every completed step and the best sample seen
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - The engine-wide error type
//! - **Reference Models** ([`models`]) - Ready-to-use surrogate model implementations

pub mod config;
pub mod convert;
pub mod error;
pub mod history;
pub mod model;
pub mod models;
pub mod progress;
pub mod scoring;
