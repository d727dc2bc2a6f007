//! The surrogate model contract and the adapter the generator drives it through.
//!
//! Any proposal algorithm (random search, Gaussian-process bandits, evolutionary proposals,
//! ...) plugs into the loop by implementing [`SurrogateModel`]. Construction is kept out of
//! that trait: models that can be built from the initial observations implement
//! [`ConstructibleModel`], and callers choose between building and handing over an existing
//! instance through [`ModelSource`].

use super::error::EngineError;
use crate::core::BoxedError;
use crate::core::mapping::ValidationError;
use crate::core::observations::{ObservationKey, ObservationSet};
use tracing::{debug, info, instrument};

/// Errors raised by model implementations are carried through unmodified.
pub type ModelError = BoxedError;

/// The capability set every surrogate model provides.
pub trait SurrogateModel {
    /// Proposes the next batch of coordinate samples, keyed canonically and without scores.
    fn recommend(&mut self) -> Result<ObservationSet, ModelError>;

    /// Incorporates newly scored samples; `observations` always carries a `values` column.
    fn update(&mut self, observations: &ObservationSet) -> Result<(), ModelError>;
}

impl<M: SurrogateModel + ?Sized> SurrogateModel for Box<M> {
    fn recommend(&mut self) -> Result<ObservationSet, ModelError> {
        (**self).recommend()
    }

    fn update(&mut self, observations: &ObservationSet) -> Result<(), ModelError> {
        (**self).update(observations)
    }
}

impl<M: SurrogateModel + ?Sized> SurrogateModel for &mut M {
    fn recommend(&mut self) -> Result<ObservationSet, ModelError> {
        (**self).recommend()
    }

    fn update(&mut self, observations: &ObservationSet) -> Result<(), ModelError> {
        (**self).update(observations)
    }
}

/// A model that can be built from the canonical initial observations plus its own options.
pub trait ConstructibleModel: SurrogateModel + Sized {
    type Options;

    fn construct(
        initial_observations: &ObservationSet,
        options: Self::Options,
    ) -> Result<Self, ModelError>;
}

pub type ModelFactory<M> = Box<dyn FnOnce(&ObservationSet) -> Result<M, ModelError>>;

/// Where the generator's model comes from.
pub enum ModelSource<M> {
    /// Build the model from the canonical initial observations.
    Construct(ModelFactory<M>),
    /// Use an already-constructed model.
    Prebuilt(M),
}

impl<M: SurrogateModel> ModelSource<M> {
    pub fn prebuilt(model: M) -> Self {
        Self::Prebuilt(model)
    }

    pub fn from_fn<F>(factory: F) -> Self
    where
        F: FnOnce(&ObservationSet) -> Result<M, ModelError> + 'static,
    {
        Self::Construct(Box::new(factory))
    }
}

impl<M> ModelSource<M>
where
    M: ConstructibleModel,
    M::Options: 'static,
{
    pub fn construct(options: M::Options) -> Self {
        Self::from_fn(move |initial| M::construct(initial, options))
    }
}

/// Owns the resolved model and exposes it to the generator.
pub struct ModelAdapter<M> {
    model: M,
}

impl<M: SurrogateModel> ModelAdapter<M> {
    /// Resolves `source` into a ready model.
    ///
    /// Prebuilt models receive `initial_observations` through one `update` call when
    /// `seed_prebuilt` is set; otherwise the caller vouches for having seeded them.
    #[instrument(skip_all, name = "model_resolution")]
    pub fn resolve(
        source: ModelSource<M>,
        initial_observations: &ObservationSet,
        seed_prebuilt: bool,
    ) -> Result<Self, EngineError> {
        let model = match source {
            ModelSource::Construct(factory) => {
                info!(
                    columns = initial_observations.len(),
                    "Constructing surrogate model from initial observations."
                );
                factory(initial_observations).map_err(|source| EngineError::Model {
                    phase: "construct",
                    source,
                })?
            }
            ModelSource::Prebuilt(mut model) => {
                if seed_prebuilt {
                    info!("Seeding prebuilt surrogate model with initial observations.");
                    model
                        .update(initial_observations)
                        .map_err(|source| EngineError::Model {
                            phase: "seed",
                            source,
                        })?;
                } else {
                    info!("Using prebuilt surrogate model as-is; initial observations are not delivered.");
                }
                model
            }
        };
        Ok(Self { model })
    }

    pub fn recommend(&mut self) -> Result<ObservationSet, EngineError> {
        let samples = self
            .model
            .recommend()
            .map_err(|source| EngineError::Model {
                phase: "recommend",
                source,
            })?;
        debug!(
            columns = samples.len(),
            samples = samples.sample_count(),
            "Model recommended new samples."
        );
        Ok(samples)
    }

    pub fn update(&mut self, observations: &ObservationSet) -> Result<(), EngineError> {
        if !observations.contains_key(&ObservationKey::Values) {
            return Err(ValidationError::MissingValues {
                keys: observations
                    .keys()
                    .map(|key| format!("`{}`", key))
                    .collect::<Vec<_>>()
                    .join(", "),
            }
            .into());
        }
        self.model
            .update(observations)
            .map_err(|source| EngineError::Model {
                phase: "update",
                source,
            })?;
        debug!(columns = observations.len(), "Model updated with scored samples.");
        Ok(())
    }
}

impl<M> ModelAdapter<M> {
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_inner(self) -> M {
        self.model
    }
}
