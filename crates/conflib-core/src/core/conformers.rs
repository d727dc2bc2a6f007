//! Conformer-ensemble generation through a third-party embedding algorithm.
//!
//! The embedding algorithm itself lives behind [`ConformerEmbedder`]; this module owns the
//! option handling, i.e. how the convenience switches of [`EmbeddingOptions`] resolve onto the
//! embedder's property names, and the driver that turns an embedding run into conformers.
//! Generated conformers can be used to seed a generator's initial observations but have no
//! runtime coupling to the search loop.

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{instrument, warn};

/// Convenience switch name -> embedder property name.
static EMBEDDING_PROPERTY_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "use_experimental_torsion_angles" => "useExpTorsionAnglePrefs",
    "use_basic_knowledge" => "useBasicKnowledge",
};

/// A single embedder parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Options controlling a conformer embedding run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EmbeddingOptions {
    /// Use experimental torsion-angle preferences.
    pub use_experimental_torsion_angles: bool,
    /// Use basic-knowledge terms (flat rings, linear triple bonds, ...).
    pub use_basic_knowledge: bool,
    /// Raw embedder properties, keyed by the embedder's own names.
    ///
    /// An entry here for a property that also has a convenience switch takes precedence
    /// over the switch.
    #[serde(flatten)]
    pub extra: BTreeMap<String, EmbeddingValue>,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            use_experimental_torsion_angles: true,
            use_basic_knowledge: true,
            extra: BTreeMap::new(),
        }
    }
}

impl EmbeddingOptions {
    pub fn property(mut self, name: impl Into<String>, value: EmbeddingValue) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// The embedder property name behind a convenience switch.
    pub fn property_name(switch: &str) -> Option<&'static str> {
        EMBEDDING_PROPERTY_NAMES.get(switch).copied()
    }

    /// Resolves the final property table handed to the embedder.
    pub fn to_parameters(&self) -> BTreeMap<String, EmbeddingValue> {
        let mut parameters = self.extra.clone();
        for (switch, property) in EMBEDDING_PROPERTY_NAMES.entries() {
            if let Some(enabled) = self.switch_value(switch) {
                parameters
                    .entry(property.to_string())
                    .or_insert(EmbeddingValue::Bool(enabled));
            }
        }
        parameters
    }

    fn switch_value(&self, switch: &str) -> Option<bool> {
        match switch {
            "use_experimental_torsion_angles" => Some(self.use_experimental_torsion_angles),
            "use_basic_knowledge" => Some(self.use_basic_knowledge),
            _ => None,
        }
    }
}

/// A third-party conformer embedding algorithm.
pub trait ConformerEmbedder {
    type Molecule;
    type Conformer;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Embeds up to `count` conformers into `molecule` and returns their ids.
    fn embed(
        &self,
        molecule: &mut Self::Molecule,
        count: usize,
        parameters: &BTreeMap<String, EmbeddingValue>,
    ) -> Result<Vec<usize>, Self::Error>;

    /// Extracts the conformer with the given id as a standalone structure.
    fn conformer(&self, molecule: &Self::Molecule, id: usize) -> Result<Self::Conformer, Self::Error>;
}

/// Generates `count` conformers of `molecule`.
///
/// Embedders may produce fewer conformers than requested when embedding attempts fail;
/// the short batch is returned as-is and logged.
#[instrument(skip_all, fields(count = count))]
pub fn generate_conformers<E: ConformerEmbedder>(
    embedder: &E,
    molecule: &mut E::Molecule,
    count: usize,
    options: &EmbeddingOptions,
) -> Result<Vec<E::Conformer>, E::Error> {
    let parameters = options.to_parameters();
    let ids = embedder.embed(molecule, count, &parameters)?;
    if ids.len() < count {
        warn!(
            requested = count,
            produced = ids.len(),
            "Embedder produced fewer conformers than requested."
        );
    }
    ids.into_iter()
        .map(|id| embedder.conformer(molecule, id))
        .collect()
}
