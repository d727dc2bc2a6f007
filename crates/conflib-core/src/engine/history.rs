use crate::core::observations::io::ObservationIoError;
use crate::core::observations::{ObservationKey, ObservationSet};
use std::cmp::Ordering;
use std::path::Path;

/// The lowest-scoring sample observed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSample {
    pub score: f64,
    /// The step (1-based) in which the sample was scored.
    pub step: usize,
    pub coordinates: Vec<(ObservationKey, f64)>,
}

/// Every scored sample of a search, in native coordinate keys, in the order it was scored.
#[derive(Debug, Clone, Default)]
pub struct SearchHistory {
    observations: ObservationSet,
    steps: usize,
    best: Option<BestSample>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one completed step; `observed` must carry a `values` column.
    pub fn record(&mut self, observed: &ObservationSet) {
        self.steps += 1;
        self.observations.append_samples(observed);

        let Some(scores) = observed.scores() else {
            return;
        };
        let candidate = scores
            .iter()
            .enumerate()
            .filter(|(_, score)| !score.is_nan())
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        if let Some((row, &score)) = candidate {
            let improves = self
                .best
                .as_ref()
                .is_none_or(|best| score < best.score);
            if improves {
                let coordinates = observed
                    .coordinates()
                    .filter_map(|(key, values)| values.get(row).map(|&v| (key.clone(), v)))
                    .collect();
                self.best = Some(BestSample {
                    score,
                    step: self.steps,
                    coordinates,
                });
            }
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of scored samples across all steps.
    pub fn len(&self) -> usize {
        self.observations.sample_count().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn best(&self) -> Option<&BestSample> {
        self.best.as_ref()
    }

    pub fn observations(&self) -> &ObservationSet {
        &self.observations
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<(), ObservationIoError> {
        self.observations.write_csv_path(path)
    }
}
