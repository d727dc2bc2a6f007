use super::config::ConfigurationMode;
use super::error::EngineError;
use crate::core::geometry::GeometryService;
use crate::core::observations::{ObservationKey, ObservationSet};
use nalgebra::DMatrix;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Unrecognized configuration mode '{0}' (expected 'cartesian', 'internal' or 'dict')")]
    UnknownMode(String),
    #[error("Key `{0}` is not a coordinate position and cannot be displaced")]
    NonCoordinateKey(ObservationKey),
    #[error("Coordinate sample vectors have inconsistent lengths")]
    RaggedSamples,
    #[error("No coordinate samples were provided")]
    EmptySamples,
    #[error("Geometry service returned {actual} configurations for {expected} samples")]
    ConfigurationCountMismatch { expected: usize, actual: usize },
}

/// The configurations handed to the scoring function.
#[derive(Debug, Clone, PartialEq)]
pub enum Configurations<C> {
    /// Dictionary mode: the coordinate samples themselves.
    Raw(ObservationSet),
    /// Geometry modes: one displaced structure per sample.
    Structures(Vec<C>),
}

impl<C> Configurations<C> {
    /// Number of configurations (samples) in the batch.
    pub fn len(&self) -> usize {
        match self {
            Self::Raw(samples) => samples.sample_count().unwrap_or(0),
            Self::Structures(structures) => structures.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_raw(&self) -> Option<&ObservationSet> {
        match self {
            Self::Raw(samples) => Some(samples),
            Self::Structures(_) => None,
        }
    }

    pub fn as_structures(&self) -> Option<&[C]> {
        match self {
            Self::Raw(_) => None,
            Self::Structures(structures) => Some(structures),
        }
    }
}

/// Lays the samples out as a row-per-sample matrix together with the coordinate list
/// describing its columns.
///
/// Both outputs are produced from a single pass over `samples`, so column `j` of the matrix
/// always holds the values of `which[j]`.
pub fn displacement_matrix(
    samples: &ObservationSet,
) -> Result<(DMatrix<f64>, Vec<Vec<usize>>), ConversionError> {
    if samples.is_empty() {
        return Err(ConversionError::EmptySamples);
    }
    let n_samples = samples
        .sample_count()
        .ok_or(ConversionError::RaggedSamples)?;

    let mut which = Vec::with_capacity(samples.len());
    let mut columns = Vec::with_capacity(samples.len());
    for (key, values) in samples.iter() {
        let indices = key
            .as_coordinate()
            .ok_or_else(|| ConversionError::NonCoordinateKey(key.clone()))?;
        which.push(indices.to_vec());
        columns.push(values);
    }

    let matrix = DMatrix::from_fn(n_samples, columns.len(), |row, col| columns[col][row]);
    Ok((matrix, which))
}

/// Converts native-keyed coordinate samples into configurations according to `mode`.
#[instrument(level = "debug", skip_all, fields(mode = %mode))]
pub fn run<G: GeometryService>(
    mode: ConfigurationMode,
    samples: ObservationSet,
    geometry: &G,
) -> Result<Configurations<G::Configuration>, EngineError> {
    let Some(displacement) = mode.displacement_mode() else {
        debug!(columns = samples.len(), "Passing raw coordinate samples through.");
        return Ok(Configurations::Raw(samples));
    };

    let (matrix, which) = displacement_matrix(&samples)?;
    debug!(
        samples = matrix.nrows(),
        coordinates = matrix.ncols(),
        ?displacement,
        "Requesting displaced configurations."
    );
    let structures = geometry
        .displaced_configurations(&matrix, &which, displacement)
        .map_err(|e| EngineError::Geometry(Box::new(e)))?;

    if structures.len() != matrix.nrows() {
        return Err(ConversionError::ConfigurationCountMismatch {
            expected: matrix.nrows(),
            actual: structures.len(),
        }
        .into());
    }
    Ok(Configurations::Structures(structures))
}
