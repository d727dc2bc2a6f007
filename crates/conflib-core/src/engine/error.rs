use super::config::ConfigError;
use super::convert::ConversionError;
use crate::core::BoxedError;
use crate::core::mapping::ValidationError;
use crate::core::observations::io::ObservationIoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid observations: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Invalid generator configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Geometry service failed: {0}")]
    Geometry(#[source] BoxedError),

    #[error("Scoring function failed: {0}")]
    Scoring(#[source] BoxedError),

    #[error("Scoring function returned {actual} scores for {expected} configurations")]
    ScoreCount { expected: usize, actual: usize },

    #[error("Surrogate model failed during '{phase}': {source}")]
    Model {
        phase: &'static str,
        #[source]
        source: BoxedError,
    },

    #[error("Observation I/O failed: {0}")]
    Observations(#[from] ObservationIoError),
}
