//! Ready-to-use [`SurrogateModel`](super::model::SurrogateModel) implementations.
//!
//! - [`random`] - Uniform random search inside the region spanned by the observations

pub mod random;

pub use random::{RandomSearchModel, RandomSearchOptions};
