use super::convert::Configurations;
use crate::core::BoxedError;

/// The external black-box that scores a batch of configurations.
///
/// Implementations receive the whole batch and return one score per configuration. Any
/// parallel evaluation of the batch is the implementation's business.
pub trait ScoringFunction<C> {
    fn score(&mut self, configurations: &Configurations<C>) -> Result<Vec<f64>, BoxedError>;
}

impl<C, F, E> ScoringFunction<C> for F
where
    F: FnMut(&Configurations<C>) -> Result<Vec<f64>, E>,
    E: Into<BoxedError>,
{
    fn score(&mut self, configurations: &Configurations<C>) -> Result<Vec<f64>, BoxedError> {
        self(configurations).map_err(Into::into)
    }
}
