use super::key::ObservationKey;

/// An ordered, column-oriented collection of samples.
///
/// Each key owns one vector holding one value per sample; vectors are parallel across keys.
/// Insertion order is preserved and defines the enumeration order used for canonical key
/// assignment and for the column order handed to the geometry service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    entries: Vec<(ObservationKey, Vec<f64>)>,
}

impl ObservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a column, replacing (in place) any existing column with the same key.
    pub fn insert(&mut self, key: ObservationKey, values: Vec<f64>) -> Option<Vec<f64>> {
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, values)),
            None => {
                self.entries.push((key, values));
                None
            }
        }
    }

    pub fn with(mut self, key: impl Into<ObservationKey>, values: Vec<f64>) -> Self {
        self.insert(key.into(), values);
        self
    }

    pub fn get(&self, key: &ObservationKey) -> Option<&[f64]> {
        self.position(key).map(|idx| self.entries[idx].1.as_slice())
    }

    pub fn remove(&mut self, key: &ObservationKey) -> Option<Vec<f64>> {
        self.position(key).map(|idx| self.entries.remove(idx).1)
    }

    pub fn contains_key(&self, key: &ObservationKey) -> bool {
        self.position(key).is_some()
    }

    /// The reserved score column, if present.
    pub fn scores(&self) -> Option<&[f64]> {
        self.get(&ObservationKey::Values)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ObservationKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObservationKey, &[f64])> {
        self.entries
            .iter()
            .map(|(key, values)| (key, values.as_slice()))
    }

    /// Iterates over every column except the reserved score column.
    pub fn coordinates(&self) -> impl Iterator<Item = (&ObservationKey, &[f64])> {
        self.iter().filter(|(key, _)| !key.is_values())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of samples held by every column, or `None` if the columns are ragged.
    ///
    /// An empty set holds zero samples.
    pub fn sample_count(&self) -> Option<usize> {
        let mut lengths = self.entries.iter().map(|(_, values)| values.len());
        match lengths.next() {
            None => Some(0),
            Some(first) => lengths.all(|len| len == first).then_some(first),
        }
    }

    /// Appends the samples of `other` below the samples already held.
    ///
    /// Columns only present on one side are padded with `NaN` so the set stays rectangular.
    pub fn append_samples(&mut self, other: &ObservationSet) {
        let held = self
            .entries
            .iter()
            .map(|(_, values)| values.len())
            .max()
            .unwrap_or(0);
        let added = other
            .entries
            .iter()
            .map(|(_, values)| values.len())
            .max()
            .unwrap_or(0);

        for (key, values) in other.iter() {
            let idx = match self.position(key) {
                Some(idx) => idx,
                None => {
                    self.entries.push((key.clone(), vec![f64::NAN; held]));
                    self.entries.len() - 1
                }
            };
            let column = &mut self.entries[idx].1;
            column.extend_from_slice(values);
            column.resize(held + added, f64::NAN);
        }

        for (_, column) in self.entries.iter_mut() {
            column.resize(held + added, f64::NAN);
        }
    }

    /// The values of every column at sample `row`, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<(ObservationKey, f64)>> {
        self.entries
            .iter()
            .map(|(key, values)| values.get(row).map(|&v| (key.clone(), v)))
            .collect()
    }

    fn position(&self, key: &ObservationKey) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl FromIterator<(ObservationKey, Vec<f64>)> for ObservationSet {
    fn from_iter<T: IntoIterator<Item = (ObservationKey, Vec<f64>)>>(iter: T) -> Self {
        let mut set = ObservationSet::new();
        for (key, values) in iter {
            set.insert(key, values);
        }
        set
    }
}

impl IntoIterator for ObservationSet {
    type Item = (ObservationKey, Vec<f64>);
    type IntoIter = std::vec::IntoIter<(ObservationKey, Vec<f64>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
