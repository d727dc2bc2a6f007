use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The literal name of the reserved score column.
pub const VALUES_KEY: &str = "values";

/// Identifies one column of an [`ObservationSet`](super::ObservationSet).
///
/// Caller-facing observation sets are keyed by coordinate positions (tuples of atom indices)
/// plus the reserved [`ObservationKey::Values`] column. Model-facing sets are keyed by
/// canonical labels such as `internal-0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObservationKey {
    /// The reserved `values` column holding the scores of each sample.
    Values,
    /// An ordered tuple of atom indices identifying a Cartesian or internal degree of freedom.
    Coordinate(Vec<usize>),
    /// Any other name, including the canonical identifiers handed to surrogate models.
    Label(String),
}

impl ObservationKey {
    pub fn coordinate(indices: impl Into<Vec<usize>>) -> Self {
        Self::Coordinate(indices.into())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }

    #[inline]
    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values)
    }

    #[inline]
    pub fn as_coordinate(&self) -> Option<&[usize]> {
        match self {
            Self::Coordinate(indices) => Some(indices),
            _ => None,
        }
    }
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Values => f.write_str(VALUES_KEY),
            Self::Coordinate(indices) => {
                f.write_str("(")?;
                for (i, index) in indices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", index)?;
                }
                f.write_str(")")
            }
            Self::Label(name) => f.write_str(name),
        }
    }
}

impl FromStr for ObservationKey {
    type Err = Infallible;

    /// Parses the textual form used in CSV headers and TOML files.
    ///
    /// `values` is the reserved score column, `(1, 2)` is a coordinate tuple, and anything
    /// else (including a parenthesised tuple with a non-numeric entry) is a label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == VALUES_KEY {
            return Ok(Self::Values);
        }
        if let Some(inner) = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let indices: Result<Vec<usize>, _> = inner
                .split(',')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::parse::<usize>)
                .collect();
            if let Ok(indices) = indices {
                return Ok(Self::Coordinate(indices));
            }
        }
        Ok(Self::Label(trimmed.to_string()))
    }
}

impl From<&str> for ObservationKey {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(key) => key,
            Err(never) => match never {},
        }
    }
}

impl From<Vec<usize>> for ObservationKey {
    fn from(indices: Vec<usize>) -> Self {
        Self::Coordinate(indices)
    }
}

impl<const N: usize> From<[usize; N]> for ObservationKey {
    fn from(indices: [usize; N]) -> Self {
        Self::Coordinate(indices.to_vec())
    }
}

impl Serialize for ObservationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObservationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(ObservationKey::from(text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_literal_parses_to_reserved_key() {
        assert_eq!(ObservationKey::from("values"), ObservationKey::Values);
        assert_eq!(ObservationKey::from("  values "), ObservationKey::Values);
    }

    #[test]
    fn parenthesised_indices_parse_to_coordinate() {
        assert_eq!(
            ObservationKey::from("(1, 2)"),
            ObservationKey::Coordinate(vec![1, 2])
        );
        assert_eq!(
            ObservationKey::from("(0,1,2,3)"),
            ObservationKey::Coordinate(vec![0, 1, 2, 3])
        );
    }

    #[test]
    fn trailing_comma_is_accepted_for_single_index_tuples() {
        assert_eq!(
            ObservationKey::from("(4,)"),
            ObservationKey::Coordinate(vec![4])
        );
    }

    #[test]
    fn non_numeric_tuple_parses_to_label() {
        assert_eq!(
            ObservationKey::from("(a, 2)"),
            ObservationKey::Label("(a, 2)".to_string())
        );
        assert_eq!(
            ObservationKey::from("(-1, 2)"),
            ObservationKey::Label("(-1, 2)".to_string())
        );
    }

    #[test]
    fn plain_text_parses_to_label() {
        assert_eq!(
            ObservationKey::from("internal-3"),
            ObservationKey::label("internal-3")
        );
    }

    #[test]
    fn display_matches_parse_form() {
        let keys = [
            ObservationKey::Values,
            ObservationKey::coordinate([1, 2, 3]),
            ObservationKey::label("internal-0"),
        ];
        for key in keys {
            assert_eq!(ObservationKey::from(key.to_string().as_str()), key);
        }
        assert_eq!(ObservationKey::coordinate([1, 2]).to_string(), "(1, 2)");
    }

    #[test]
    fn as_coordinate_only_returns_indices_for_coordinates() {
        assert_eq!(
            ObservationKey::coordinate([5, 6]).as_coordinate(),
            Some(&[5, 6][..])
        );
        assert_eq!(ObservationKey::Values.as_coordinate(), None);
        assert_eq!(ObservationKey::label("x").as_coordinate(), None);
    }

    #[test]
    fn deserializes_from_toml_string() {
        #[derive(Deserialize)]
        struct Holder {
            key: ObservationKey,
        }
        let holder: Holder = toml::from_str(r#"key = "(2, 7)""#).unwrap();
        assert_eq!(holder.key, ObservationKey::coordinate([2, 7]));
    }
}
