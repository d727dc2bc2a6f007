use crate::core::geometry::GeometryService;
use crate::core::mapping::{KeyMapping, validate_initial_observations};
use crate::core::observations::{ObservationKey, ObservationSet};
use crate::engine::config::{ConfigurationMode, GeneratorConfig};
use crate::engine::convert::{self, Configurations};
use crate::engine::error::EngineError;
use crate::engine::history::SearchHistory;
use crate::engine::model::{ModelAdapter, ModelSource, SurrogateModel};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scoring::ScoringFunction;
use tracing::{debug, info, instrument};

/// The result of one completed search step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome<C> {
    pub configurations: Configurations<C>,
    /// One score per configuration, in configuration order.
    pub scores: Vec<f64>,
}

/// Drives the recommend → convert → score → update loop for one molecule.
///
/// The key mapping, configuration mode and reference geometry are fixed at construction. The
/// surrogate model is the only state that changes between steps, and it changes only when a
/// step completes.
pub struct ConfigurationGenerator<M, G, S> {
    model: ModelAdapter<M>,
    geometry: G,
    mapping: KeyMapping,
    mode: ConfigurationMode,
    scoring: S,
    history: SearchHistory,
}

impl<M, G, S> ConfigurationGenerator<M, G, S>
where
    M: SurrogateModel,
    G: GeometryService,
    S: ScoringFunction<G::Configuration>,
{
    /// Validates `initial_observations`, prepares the reference geometry and resolves the
    /// surrogate model.
    ///
    /// Validation runs before anything else, so malformed observations never reach the
    /// geometry or the model factory.
    #[instrument(skip_all, name = "generator_setup", fields(mode = %config.configuration_mode))]
    pub fn new(
        model_source: ModelSource<M>,
        reference_geometry: G,
        initial_observations: &ObservationSet,
        scoring_function: S,
        config: &GeneratorConfig,
    ) -> Result<Self, EngineError> {
        validate_initial_observations(initial_observations)?;

        let mapping = match &config.key_mapping {
            Some(mapping) => {
                debug!(pairs = mapping.len(), "Using caller-supplied key mapping.");
                mapping.clone()
            }
            None => KeyMapping::build(initial_observations)?,
        };

        let geometry = match &config.internals {
            Some(internals) => {
                debug!(count = internals.len(), "Attaching internal coordinates to the reference geometry.");
                reference_geometry
                    .with_internals(internals)
                    .map_err(|e| EngineError::Geometry(Box::new(e)))?
            }
            None => reference_geometry,
        };

        let canonical = mapping.translate_to_canonical(initial_observations);
        let model = ModelAdapter::resolve(model_source, &canonical, config.seed_prebuilt_model)?;

        info!(
            coordinates = mapping.len().saturating_sub(1),
            samples = initial_observations.sample_count().unwrap_or(0),
            "Configuration generator ready."
        );

        Ok(Self {
            model,
            geometry,
            mapping,
            mode: config.configuration_mode,
            scoring: scoring_function,
            history: SearchHistory::new(),
        })
    }

    /// Runs one atomic search iteration.
    ///
    /// When `samples` is `None` the model is asked for a recommendation. Supplied samples are
    /// used as given, both for conversion and for the subsequent model update. If conversion
    /// or scoring fails, the model is not updated and the history is left untouched.
    pub fn process_next_step(
        &mut self,
        samples: Option<ObservationSet>,
    ) -> Result<StepOutcome<G::Configuration>, EngineError> {
        let samples = match samples {
            Some(samples) => samples,
            None => self.model.recommend()?,
        };

        let native = self.mapping.samples_from_canonical(&samples)?;
        let configurations = convert::run(self.mode, native.clone(), &self.geometry)?;

        let scores = self
            .scoring
            .score(&configurations)
            .map_err(EngineError::Scoring)?;
        if scores.len() != configurations.len() {
            return Err(EngineError::ScoreCount {
                expected: configurations.len(),
                actual: scores.len(),
            });
        }

        let mut augmented = samples;
        augmented.insert(ObservationKey::Values, scores.clone());
        self.model.update(&augmented)?;

        let mut observed = native;
        observed.insert(ObservationKey::Values, scores.clone());
        self.history.record(&observed);

        debug!(
            step = self.history.steps(),
            configurations = configurations.len(),
            "Search step completed."
        );
        Ok(StepOutcome {
            configurations,
            scores,
        })
    }

    /// Runs `steps` model-driven iterations, stopping at the first failure.
    #[instrument(skip_all, name = "search_workflow", fields(steps = steps))]
    pub fn run(&mut self, steps: u64, reporter: &ProgressReporter) -> Result<(), EngineError> {
        info!("Starting search.");
        reporter.report(Progress::SearchStart { total_steps: steps });

        for step in 1..=steps {
            let previous_best = self.history.best().map(|best| best.score);
            self.process_next_step(None)?;
            let best_score = self.history.best().map(|best| best.score);
            if let Some(score) = best_score.filter(|&score| Some(score) != previous_best) {
                reporter.report(Progress::Message(format!(
                    "New best score {:.6} at step {}",
                    score, step
                )));
            }
            reporter.report(Progress::StepFinish { step, best_score });
        }

        reporter.report(Progress::SearchFinish);
        match self.history.best() {
            Some(best) => info!(score = best.score, step = best.step, "Search finished."),
            None => info!("Search finished without a finite score."),
        }
        Ok(())
    }
}

impl<M, G, S> ConfigurationGenerator<M, G, S> {
    pub fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }

    pub fn mode(&self) -> ConfigurationMode {
        self.mode
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn model(&self) -> &M {
        self.model.model()
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn into_history(self) -> SearchHistory {
        self.history
    }
}
