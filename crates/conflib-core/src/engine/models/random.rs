use crate::core::observations::{ObservationKey, ObservationSet};
use crate::engine::model::{ConstructibleModel, ModelError, SurrogateModel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RandomSearchError {
    #[error("Batch size must be at least 1")]
    ZeroBatch,
    #[error("Padding must be a finite, non-negative fraction, got {0}")]
    InvalidPadding(f64),
    #[error("Observations contain no coordinate columns")]
    NoCoordinates,
    #[error("Coordinate `{0}` has no finite values")]
    NoFiniteValues(ObservationKey),
    #[error("Observations lack a `values` column")]
    MissingValues,
    #[error("Column `{key}` has {actual} entries but `values` has {expected}")]
    LengthMismatch {
        key: ObservationKey,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct RandomSearchOptions {
    /// Number of samples proposed per recommendation.
    pub batch_size: usize,
    /// Fraction of each coordinate's observed range added on both sides of the search box.
    pub padding: f64,
    /// Seed for reproducible proposals; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for RandomSearchOptions {
    fn default() -> Self {
        Self {
            batch_size: 1,
            padding: 0.1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    fn spanning(values: &[f64]) -> Option<Self> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Bounds>, v| {
                Some(match acc {
                    None => Bounds { lower: v, upper: v },
                    Some(b) => Bounds {
                        lower: b.lower.min(v),
                        upper: b.upper.max(v),
                    },
                })
            })
    }

    fn padded(self, padding: f64) -> Self {
        let width = self.upper - self.lower;
        let margin = if width > 0.0 { width * padding } else { padding };
        Bounds {
            lower: self.lower - margin,
            upper: self.upper + margin,
        }
    }

    fn include(&mut self, value: f64) {
        if value.is_finite() {
            self.lower = self.lower.min(value);
            self.upper = self.upper.max(value);
        }
    }

    fn sample(&self, rng: &mut impl Rng) -> f64 {
        self.lower + rng.r#gen::<f64>() * (self.upper - self.lower)
    }
}

/// Proposes samples uniformly at random inside the (padded) box spanned by every observation
/// seen so far.
///
/// This is a baseline, not a Bayesian optimizer: scores only feed the best-score bookkeeping.
#[derive(Debug, Clone)]
pub struct RandomSearchModel {
    bounds: Vec<(ObservationKey, Bounds)>,
    options: RandomSearchOptions,
    rng: StdRng,
    observed: usize,
    best_score: Option<f64>,
}

impl RandomSearchModel {
    pub fn new(
        initial_observations: &ObservationSet,
        options: RandomSearchOptions,
    ) -> Result<Self, RandomSearchError> {
        if options.batch_size == 0 {
            return Err(RandomSearchError::ZeroBatch);
        }
        if !options.padding.is_finite() || options.padding < 0.0 {
            return Err(RandomSearchError::InvalidPadding(options.padding));
        }

        let bounds = initial_observations
            .coordinates()
            .map(|(key, values)| {
                Bounds::spanning(values)
                    .map(|b| (key.clone(), b.padded(options.padding)))
                    .ok_or_else(|| RandomSearchError::NoFiniteValues(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if bounds.is_empty() {
            return Err(RandomSearchError::NoCoordinates);
        }

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut model = Self {
            bounds,
            options,
            rng,
            observed: 0,
            best_score: None,
        };
        if let Some(scores) = initial_observations.scores() {
            model.observe_scores(scores);
        }
        debug!(
            coordinates = model.bounds.len(),
            batch_size = model.options.batch_size,
            "Random search model initialized."
        );
        Ok(model)
    }

    /// The current search interval of `key`.
    pub fn bounds(&self, key: &ObservationKey) -> Option<(f64, f64)> {
        self.bounds
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, b)| (b.lower, b.upper))
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_score
    }

    /// Number of scored samples the model has been told about.
    pub fn observed(&self) -> usize {
        self.observed
    }

    fn observe_scores(&mut self, scores: &[f64]) {
        self.observed += scores.len();
        for &score in scores.iter().filter(|s| !s.is_nan()) {
            if self.best_score.is_none_or(|best| score < best) {
                self.best_score = Some(score);
            }
        }
    }

    fn check_update(&self, observations: &ObservationSet) -> Result<usize, RandomSearchError> {
        let expected = observations
            .scores()
            .ok_or(RandomSearchError::MissingValues)?
            .len();
        for (key, values) in observations.coordinates() {
            if values.len() != expected {
                return Err(RandomSearchError::LengthMismatch {
                    key: key.clone(),
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(expected)
    }
}

impl SurrogateModel for RandomSearchModel {
    fn recommend(&mut self) -> Result<ObservationSet, ModelError> {
        let batch = self.options.batch_size;
        let rng = &mut self.rng;
        let samples = self
            .bounds
            .iter()
            .map(|(key, bounds)| {
                let values: Vec<f64> = (0..batch).map(|_| bounds.sample(rng)).collect();
                (key.clone(), values)
            })
            .collect();
        trace!(batch, "Drew random proposals.");
        Ok(samples)
    }

    fn update(&mut self, observations: &ObservationSet) -> Result<(), ModelError> {
        self.check_update(observations)?;

        for (key, values) in observations.coordinates() {
            match self.bounds.iter_mut().find(|(k, _)| k == key) {
                Some((_, bounds)) => values.iter().for_each(|&v| bounds.include(v)),
                None => trace!(key = %key, "Ignoring column outside the search space."),
            }
        }
        if let Some(scores) = observations.scores() {
            self.observe_scores(scores);
        }
        Ok(())
    }
}

impl ConstructibleModel for RandomSearchModel {
    type Options = RandomSearchOptions;

    fn construct(
        initial_observations: &ObservationSet,
        options: Self::Options,
    ) -> Result<Self, ModelError> {
        Ok(Self::new(initial_observations, options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initial() -> ObservationSet {
        ObservationSet::new()
            .with("internal-0", vec![1.0, 2.0])
            .with("internal-1", vec![-1.0, -1.0])
            .with(ObservationKey::Values, vec![5.0, 3.0])
    }

    fn seeded(batch_size: usize) -> RandomSearchOptions {
        RandomSearchOptions {
            batch_size,
            padding: 0.5,
            seed: Some(11),
        }
    }

    #[test]
    fn bounds_are_padded_observed_ranges() {
        let model = RandomSearchModel::new(&initial(), seeded(1)).unwrap();
        assert_eq!(
            model.bounds(&ObservationKey::label("internal-0")),
            Some((0.5, 2.5))
        );
        assert_eq!(
            model.bounds(&ObservationKey::label("internal-1")),
            Some((-1.5, -0.5))
        );
        assert_eq!(model.bounds(&ObservationKey::Values), None);
    }

    #[test]
    fn initial_scores_seed_best_score() {
        let model = RandomSearchModel::new(&initial(), seeded(1)).unwrap();
        assert_eq!(model.best_score(), Some(3.0));
        assert_eq!(model.observed(), 2);
    }

    #[test]
    fn recommend_draws_batch_inside_bounds_without_values() {
        let mut model = RandomSearchModel::new(&initial(), seeded(4)).unwrap();
        let samples = model.recommend().unwrap();

        assert!(!samples.contains_key(&ObservationKey::Values));
        assert_eq!(samples.sample_count(), Some(4));
        let first = samples.get(&ObservationKey::label("internal-0")).unwrap();
        assert!(first.iter().all(|&v| (0.5..=2.5).contains(&v)));
        let keys: Vec<_> = samples.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                ObservationKey::label("internal-0"),
                ObservationKey::label("internal-1")
            ]
        );
    }

    #[test]
    fn equal_seeds_give_equal_proposals() {
        let mut a = RandomSearchModel::new(&initial(), seeded(3)).unwrap();
        let mut b = RandomSearchModel::new(&initial(), seeded(3)).unwrap();
        assert_eq!(a.recommend().unwrap(), b.recommend().unwrap());
    }

    #[test]
    fn update_widens_bounds_and_tracks_best() {
        let mut model = RandomSearchModel::new(&initial(), seeded(1)).unwrap();
        let scored = ObservationSet::new()
            .with("internal-0", vec![4.0])
            .with("internal-1", vec![-1.2])
            .with(ObservationKey::Values, vec![0.5]);
        model.update(&scored).unwrap();

        assert_eq!(
            model.bounds(&ObservationKey::label("internal-0")),
            Some((0.5, 4.0))
        );
        assert_eq!(model.best_score(), Some(0.5));
        assert_eq!(model.observed(), 3);
    }

    #[test]
    fn update_ignores_columns_outside_the_search_space() {
        let mut model = RandomSearchModel::new(&initial(), seeded(1)).unwrap();
        let scored = ObservationSet::new()
            .with([1, 2], vec![1.0, 3.0])
            .with(ObservationKey::Values, vec![1.0, 0.5]);
        model.update(&scored).unwrap();

        assert_eq!(model.bounds(&ObservationKey::coordinate([1, 2])), None);
        assert_eq!(model.best_score(), Some(0.5));
        let proposal = model.recommend().unwrap();
        assert_eq!(
            proposal.keys().cloned().collect::<Vec<_>>(),
            vec![ObservationKey::label("internal-0"), ObservationKey::label("internal-1")]
        );
    }

    #[test]
    fn update_requires_values_column() {
        let mut model = RandomSearchModel::new(&initial(), seeded(1)).unwrap();
        let err = model
            .update(&ObservationSet::new().with("internal-0", vec![1.0]))
            .unwrap_err();
        assert!(err.to_string().contains("`values`"));
    }

    #[test]
    fn update_rejects_mismatched_lengths() {
        let mut model = RandomSearchModel::new(&initial(), seeded(1)).unwrap();
        let scored = ObservationSet::new()
            .with("internal-0", vec![1.0, 2.0])
            .with(ObservationKey::Values, vec![1.0]);
        assert!(model.update(&scored).is_err());
        assert_eq!(model.observed(), 2);
    }

    #[test]
    fn new_rejects_zero_batch() {
        let result = RandomSearchModel::new(&initial(), seeded(0));
        assert!(matches!(result, Err(RandomSearchError::ZeroBatch)));
    }

    #[test]
    fn new_rejects_sets_without_coordinates() {
        let only_values = ObservationSet::new().with(ObservationKey::Values, vec![1.0]);
        let result = RandomSearchModel::new(&only_values, seeded(1));
        assert!(matches!(result, Err(RandomSearchError::NoCoordinates)));
    }

    #[test]
    fn single_point_coordinates_get_absolute_padding() {
        let single = ObservationSet::new()
            .with("internal-0", vec![2.0])
            .with(ObservationKey::Values, vec![1.0]);
        let model = RandomSearchModel::new(&single, seeded(1)).unwrap();
        assert_eq!(
            model.bounds(&ObservationKey::label("internal-0")),
            Some((1.5, 2.5))
        );
    }

    #[test]
    fn options_deserialize_from_kebab_case_toml() {
        let options: RandomSearchOptions =
            toml::from_str("batch-size = 8\nseed = 3\n").unwrap();
        assert_eq!(options.batch_size, 8);
        assert_eq!(options.seed, Some(3));
        assert_eq!(options.padding, 0.1);
    }
}
