//! Bookkeeping between the caller's coordinate keys and the canonical keys seen by the model.
//!
//! Surrogate models only ever see positional identifiers (`internal-0`, `internal-1`, ...),
//! while the geometry service and the scoring function work with coordinate tuples. The
//! [`KeyMapping`] is computed once from the initial observations and is the single source of
//! truth for translating between the two spaces. The reserved `values` key is a fixed point
//! of both directions.

use super::observations::{ObservationKey, ObservationSet};
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

/// Prefix of the canonical identifiers assigned to coordinate keys.
pub const CANONICAL_KEY_PREFIX: &str = "internal-";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Initial observations must contain a `values` entry, got [{keys}]")]
    MissingValues { keys: String },

    #[error(
        "Initial observation keys must all be internal coordinate positions, got `{key}` in [{keys}]"
    )]
    InvalidKey { key: ObservationKey, keys: String },

    #[error("Key mapping must map `values` onto itself, got `{0}`")]
    ValuesRemapped(ObservationKey),

    #[error("Key mapping assigns canonical key `{0}` more than once")]
    DuplicateCanonicalKey(ObservationKey),

    #[error("Key mapping lists raw key `{0}` more than once")]
    DuplicateRawKey(ObservationKey),

    #[error("Samples hold more than one column for native key `{0}`")]
    DuplicateNativeKey(ObservationKey),
}

/// Checks that `observations` can seed a generator.
///
/// The set must hold a `values` column, and every other key must be a coordinate tuple.
pub fn validate_initial_observations(observations: &ObservationSet) -> Result<(), ValidationError> {
    if !observations.contains_key(&ObservationKey::Values) {
        return Err(ValidationError::MissingValues {
            keys: format_keys(observations),
        });
    }
    if let Some(key) = observations
        .keys()
        .find(|key| !matches!(key, ObservationKey::Values | ObservationKey::Coordinate(_)))
    {
        return Err(ValidationError::InvalidKey {
            key: key.clone(),
            keys: format_keys(observations),
        });
    }
    Ok(())
}

/// The canonical identifier assigned to the key at enumeration position `index`.
pub fn canonical_key(index: usize) -> ObservationKey {
    ObservationKey::Label(format!("{}{}", CANONICAL_KEY_PREFIX, index))
}

/// An ordered bijection between raw observation keys and canonical model keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyMapping {
    pairs: Vec<(ObservationKey, ObservationKey)>,
    to_canonical: HashMap<ObservationKey, usize>,
    from_canonical: HashMap<ObservationKey, usize>,
}

impl KeyMapping {
    /// Derives the mapping from the caller's initial observations.
    ///
    /// Keys are enumerated in insertion order and the key at position `i` becomes
    /// `internal-<i>`; the position counts the `values` column too, which maps to itself.
    pub fn build(initial_observations: &ObservationSet) -> Result<Self, ValidationError> {
        validate_initial_observations(initial_observations)?;
        let pairs = initial_observations
            .keys()
            .enumerate()
            .map(|(i, key)| {
                let canonical = if key.is_values() {
                    ObservationKey::Values
                } else {
                    canonical_key(i)
                };
                (key.clone(), canonical)
            })
            .collect();
        Self::from_pairs(pairs)
    }

    /// Builds a mapping from explicit `(raw, canonical)` pairs.
    pub fn from_pairs(pairs: Vec<(ObservationKey, ObservationKey)>) -> Result<Self, ValidationError> {
        let mut to_canonical = HashMap::with_capacity(pairs.len());
        let mut from_canonical = HashMap::with_capacity(pairs.len());

        for (idx, (raw, canonical)) in pairs.iter().enumerate() {
            if raw.is_values() != canonical.is_values() {
                let offending = if raw.is_values() { canonical } else { raw };
                return Err(ValidationError::ValuesRemapped(offending.clone()));
            }
            if to_canonical.insert(raw.clone(), idx).is_some() {
                return Err(ValidationError::DuplicateRawKey(raw.clone()));
            }
            if from_canonical.insert(canonical.clone(), idx).is_some() {
                return Err(ValidationError::DuplicateCanonicalKey(canonical.clone()));
            }
        }

        Ok(Self {
            pairs,
            to_canonical,
            from_canonical,
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The `(raw, canonical)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ObservationKey, &ObservationKey)> {
        self.pairs.iter().map(|(raw, canonical)| (raw, canonical))
    }

    /// The canonical key for `raw`; unknown keys pass through unchanged.
    pub fn to_canonical(&self, raw: &ObservationKey) -> ObservationKey {
        if raw.is_values() {
            return ObservationKey::Values;
        }
        self.to_canonical
            .get(raw)
            .map(|&idx| self.pairs[idx].1.clone())
            .unwrap_or_else(|| raw.clone())
    }

    /// The raw key for `canonical`; unknown keys pass through unchanged.
    pub fn translate_from_canonical(&self, canonical: &ObservationKey) -> ObservationKey {
        if canonical.is_values() {
            return ObservationKey::Values;
        }
        self.from_canonical
            .get(canonical)
            .map(|&idx| self.pairs[idx].0.clone())
            .unwrap_or_else(|| canonical.clone())
    }

    /// Re-keys a caller-space observation set into the model's canonical key-space.
    pub fn translate_to_canonical(&self, observations: &ObservationSet) -> ObservationSet {
        trace!(columns = observations.len(), "Translating observations to canonical keys.");
        observations
            .iter()
            .map(|(key, values)| (self.to_canonical(key), values.to_vec()))
            .collect()
    }

    /// Re-keys a model-space observation set back into the caller's coordinate keys.
    ///
    /// Fails when two columns land on the same native key, e.g. a canonical key next to
    /// the raw key it stands for.
    pub fn samples_from_canonical(
        &self,
        samples: &ObservationSet,
    ) -> Result<ObservationSet, ValidationError> {
        trace!(columns = samples.len(), "Translating samples to native coordinate keys.");
        let mut native = ObservationSet::new();
        for (key, values) in samples.iter() {
            let key = self.translate_from_canonical(key);
            if native.contains_key(&key) {
                return Err(ValidationError::DuplicateNativeKey(key));
            }
            native.insert(key, values.to_vec());
        }
        Ok(native)
    }
}

fn format_keys(observations: &ObservationSet) -> String {
    observations
        .keys()
        .map(|key| format!("`{}`", key))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initial_observations() -> ObservationSet {
        ObservationSet::new()
            .with([1, 2], vec![0.1, 0.2])
            .with([0, 1, 2], vec![1.0, 1.1])
            .with(ObservationKey::Values, vec![1.0, 2.0])
    }

    #[test]
    fn build_assigns_positional_canonical_keys() {
        let set = ObservationSet::new()
            .with([1, 2], vec![0.1, 0.2])
            .with(ObservationKey::Values, vec![1.0, 2.0]);
        let mapping = KeyMapping::build(&set).unwrap();

        let pairs: Vec<_> = mapping
            .iter()
            .map(|(raw, canonical)| (raw.clone(), canonical.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (ObservationKey::coordinate([1, 2]), canonical_key(0)),
                (ObservationKey::Values, ObservationKey::Values),
            ]
        );
        assert_eq!(canonical_key(0), ObservationKey::label("internal-0"));
    }

    #[test]
    fn enumeration_index_counts_the_values_position() {
        let set = ObservationSet::new()
            .with(ObservationKey::Values, vec![1.0])
            .with([3, 4], vec![0.5]);
        let mapping = KeyMapping::build(&set).unwrap();
        assert_eq!(
            mapping.to_canonical(&ObservationKey::coordinate([3, 4])),
            ObservationKey::label("internal-1")
        );
    }

    #[test]
    fn build_fails_without_values_entry() {
        let set = ObservationSet::new().with([1, 2], vec![0.1]);
        let result = KeyMapping::build(&set);
        assert!(matches!(result, Err(ValidationError::MissingValues { .. })));
    }

    #[test]
    fn build_fails_for_label_keys() {
        let set = ObservationSet::new()
            .with("bad", vec![0.1])
            .with(ObservationKey::Values, vec![1.0]);
        let result = KeyMapping::build(&set);
        assert_eq!(
            result,
            Err(ValidationError::InvalidKey {
                key: ObservationKey::label("bad"),
                keys: "`bad`, `values`".to_string(),
            })
        );
    }

    #[test]
    fn build_fails_for_non_numeric_tuple_text() {
        let set = ObservationSet::new()
            .with("(a, b)", vec![0.1])
            .with(ObservationKey::Values, vec![1.0]);
        assert!(matches!(
            KeyMapping::build(&set),
            Err(ValidationError::InvalidKey { .. })
        ));
    }

    #[test]
    fn canonical_round_trip_restores_original_keys() {
        let set = initial_observations();
        let mapping = KeyMapping::build(&set).unwrap();

        let canonical = mapping.translate_to_canonical(&set);
        assert!(canonical.contains_key(&ObservationKey::label("internal-0")));
        assert!(canonical.contains_key(&ObservationKey::label("internal-1")));
        assert!(canonical.contains_key(&ObservationKey::Values));

        let restored = mapping.samples_from_canonical(&canonical).unwrap();
        assert_eq!(restored, set);
    }

    #[test]
    fn samples_colliding_on_a_native_key_are_rejected() {
        let mapping = KeyMapping::build(&initial_observations()).unwrap();
        let samples = ObservationSet::new()
            .with("internal-0", vec![0.1])
            .with([1, 2], vec![0.2]);
        assert_eq!(
            mapping.samples_from_canonical(&samples),
            Err(ValidationError::DuplicateNativeKey(ObservationKey::coordinate([1, 2])))
        );
    }

    #[test]
    fn negative_tuple_entries_are_labels_and_fail_validation() {
        let key = ObservationKey::from("(-1, 2)");
        assert_eq!(key, ObservationKey::label("(-1, 2)"));
        let set = ObservationSet::new()
            .with(key, vec![0.1])
            .with(ObservationKey::Values, vec![1.0]);
        assert!(matches!(
            validate_initial_observations(&set),
            Err(ValidationError::InvalidKey { .. })
        ));
    }

    #[test]
    fn values_key_is_a_fixed_point_in_both_directions() {
        let mapping = KeyMapping::build(&initial_observations()).unwrap();
        assert_eq!(
            mapping.to_canonical(&ObservationKey::Values),
            ObservationKey::Values
        );
        assert_eq!(
            mapping.translate_from_canonical(&ObservationKey::Values),
            ObservationKey::Values
        );
    }

    #[test]
    fn unknown_keys_pass_through_unchanged() {
        let mapping = KeyMapping::build(&initial_observations()).unwrap();
        let novel = ObservationKey::coordinate([7, 8]);
        assert_eq!(mapping.to_canonical(&novel), novel);
        let unknown_label = ObservationKey::label("internal-99");
        assert_eq!(mapping.translate_from_canonical(&unknown_label), unknown_label);
    }

    #[test]
    fn from_pairs_rejects_remapped_values() {
        let result = KeyMapping::from_pairs(vec![(
            ObservationKey::Values,
            ObservationKey::label("score"),
        )]);
        assert_eq!(
            result,
            Err(ValidationError::ValuesRemapped(ObservationKey::label("score")))
        );
    }

    #[test]
    fn from_pairs_rejects_duplicate_canonical_keys() {
        let result = KeyMapping::from_pairs(vec![
            (ObservationKey::coordinate([0, 1]), ObservationKey::label("bond")),
            (ObservationKey::coordinate([1, 2]), ObservationKey::label("bond")),
        ]);
        assert!(matches!(
            result,
            Err(ValidationError::DuplicateCanonicalKey(_))
        ));
    }

    #[test]
    fn from_pairs_rejects_duplicate_raw_keys() {
        let result = KeyMapping::from_pairs(vec![
            (ObservationKey::coordinate([0, 1]), ObservationKey::label("a")),
            (ObservationKey::coordinate([0, 1]), ObservationKey::label("b")),
        ]);
        assert!(matches!(result, Err(ValidationError::DuplicateRawKey(_))));
    }
}
