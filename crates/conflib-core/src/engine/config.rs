use super::convert::ConversionError;
use crate::core::geometry::DisplacementMode;
use crate::core::mapping::{KeyMapping, ValidationError};
use crate::core::observations::ObservationKey;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid key mapping: {0}")]
    KeyMapping(#[from] ValidationError),
}

/// How coordinate samples are turned into configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConfigurationMode {
    /// Samples are Cartesian displacements; the geometry reembeds after applying them.
    #[default]
    Cartesian,
    /// Samples are internal-coordinate displacements.
    Internal,
    /// No geometry: the scoring function receives the raw coordinate vectors.
    Dict,
}

impl ConfigurationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cartesian => "cartesian",
            Self::Internal => "internal",
            Self::Dict => "dict",
        }
    }

    /// The displacement request sent to the geometry service, or `None` for [`Self::Dict`].
    pub fn displacement_mode(&self) -> Option<DisplacementMode> {
        match self {
            Self::Cartesian => Some(DisplacementMode::Reembed),
            Self::Internal => Some(DisplacementMode::Internal),
            Self::Dict => None,
        }
    }
}

impl fmt::Display for ConfigurationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cartesian" | "cartesians" => Ok(Self::Cartesian),
            "internal" | "internals" => Ok(Self::Internal),
            "dict" => Ok(Self::Dict),
            _ => Err(ConversionError::UnknownMode(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigurationMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Settings fixed for the lifetime of a configuration generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub configuration_mode: ConfigurationMode,
    /// Internal-coordinate definition applied to the reference geometry at construction.
    pub internals: Option<Vec<Vec<usize>>>,
    /// Replaces the mapping derived from the initial observations.
    pub key_mapping: Option<KeyMapping>,
    /// Deliver the initial observations to prebuilt models through `update`.
    pub seed_prebuilt_model: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            configuration_mode: ConfigurationMode::default(),
            internals: None,
            key_mapping: None,
            seed_prebuilt_model: true,
        }
    }
}

impl GeneratorConfig {
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: GeneratorConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        file.into_config()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: GeneratorConfigFile = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<string>".to_string(),
            source: e,
        })?;
        file.into_config()
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct KeyMappingEntry {
    pub raw: ObservationKey,
    pub canonical: ObservationKey,
}

/// The on-disk form of a [`GeneratorConfig`]; every field is optional.
///
/// ```toml
/// configuration-mode = "internal"
/// internals = [[0, 1], [0, 1, 2]]
/// seed-prebuilt-model = false
///
/// [[key-mapping]]
/// raw = "(0, 1)"
/// canonical = "bond"
/// ```
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GeneratorConfigFile {
    pub configuration_mode: Option<ConfigurationMode>,
    pub internals: Option<Vec<Vec<usize>>>,
    pub key_mapping: Option<Vec<KeyMappingEntry>>,
    pub seed_prebuilt_model: Option<bool>,
}

impl GeneratorConfigFile {
    pub fn into_config(self) -> Result<GeneratorConfig, ConfigError> {
        let mut builder = GeneratorConfigBuilder::new();
        if let Some(mode) = self.configuration_mode {
            builder = builder.configuration_mode(mode);
        }
        if let Some(internals) = self.internals {
            builder = builder.internals(internals);
        }
        if let Some(entries) = self.key_mapping {
            builder = builder.key_mapping(
                entries
                    .into_iter()
                    .map(|entry| (entry.raw, entry.canonical))
                    .collect(),
            );
        }
        if let Some(seed) = self.seed_prebuilt_model {
            builder = builder.seed_prebuilt_model(seed);
        }
        builder.build()
    }
}

#[derive(Default)]
pub struct GeneratorConfigBuilder {
    configuration_mode: Option<ConfigurationMode>,
    internals: Option<Vec<Vec<usize>>>,
    key_mapping: Option<Vec<(ObservationKey, ObservationKey)>>,
    seed_prebuilt_model: Option<bool>,
}

impl GeneratorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configuration_mode(mut self, mode: ConfigurationMode) -> Self {
        self.configuration_mode = Some(mode);
        self
    }
    pub fn internals(mut self, internals: Vec<Vec<usize>>) -> Self {
        self.internals = Some(internals);
        self
    }
    pub fn key_mapping(mut self, pairs: Vec<(ObservationKey, ObservationKey)>) -> Self {
        self.key_mapping = Some(pairs);
        self
    }
    pub fn seed_prebuilt_model(mut self, seed: bool) -> Self {
        self.seed_prebuilt_model = Some(seed);
        self
    }

    pub fn build(self) -> Result<GeneratorConfig, ConfigError> {
        let defaults = GeneratorConfig::default();
        let key_mapping = self.key_mapping.map(KeyMapping::from_pairs).transpose()?;
        Ok(GeneratorConfig {
            configuration_mode: self
                .configuration_mode
                .unwrap_or(defaults.configuration_mode),
            internals: self.internals,
            key_mapping,
            seed_prebuilt_model: self
                .seed_prebuilt_model
                .unwrap_or(defaults.seed_prebuilt_model),
        })
    }
}
