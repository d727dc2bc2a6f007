use nalgebra::DMatrix;
use thiserror::Error;

/// How a displacement matrix is to be interpreted by a [`GeometryService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplacementMode {
    /// Cartesian displacements applied as-is, without reembedding.
    Cartesian,
    /// Displacements of internal coordinates.
    Internal,
    /// Cartesian displacements followed by restoring internal-coordinate consistency.
    Reembed,
}

/// The reference-geometry contract consumed by the configuration generator.
///
/// Implementors own a reference structure (and optionally its internal-coordinate
/// definition) and produce new displaced configurations from it without mutating it.
pub trait GeometryService {
    /// One concrete physical configuration (structure) produced by a displacement.
    type Configuration;

    /// The error type raised by the displacement machinery.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns a copy of this geometry that uses `internals` as its internal-coordinate
    /// definition.
    fn with_internals(self, internals: &[Vec<usize>]) -> Result<Self, Self::Error>
    where
        Self: Sized;

    /// Builds one configuration per row of `displacements`.
    ///
    /// Column `j` of `displacements` holds the values for the coordinate `which[j]`; the two
    /// are zipped positionally, so their orders must agree.
    fn displaced_configurations(
        &self,
        displacements: &DMatrix<f64>,
        which: &[Vec<usize>],
        mode: DisplacementMode,
    ) -> Result<Vec<Self::Configuration>, Self::Error>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoGeometryError {
    #[error("No reference geometry is available for {0:?} displacements")]
    Unavailable(DisplacementMode),
    #[error("No reference geometry is available to attach internal coordinates to")]
    InternalsUnsupported,
}

/// A placeholder geometry for generators that only ever run in dictionary mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoGeometry;

impl GeometryService for NoGeometry {
    type Configuration = std::convert::Infallible;
    type Error = NoGeometryError;

    fn with_internals(self, _internals: &[Vec<usize>]) -> Result<Self, Self::Error> {
        Err(NoGeometryError::InternalsUnsupported)
    }

    fn displaced_configurations(
        &self,
        _displacements: &DMatrix<f64>,
        _which: &[Vec<usize>],
        mode: DisplacementMode,
    ) -> Result<Vec<Self::Configuration>, Self::Error> {
        Err(NoGeometryError::Unavailable(mode))
    }
}
