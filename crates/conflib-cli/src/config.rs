use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use conflib::engine::config::{GeneratorConfig, GeneratorConfigFile};
use conflib::engine::models::RandomSearchOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_STEPS: u64 = 10;
const DEFAULT_OUTPUT: &str = "history.csv";

/// The external command that scores a batch.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ScoringSection {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A search description as written on disk; anything may be left out and filled from the
/// command line or defaults.
///
/// ```toml
/// initial-observations = "initial.csv"
/// steps = 20
///
/// [generator]
/// configuration-mode = "dict"
///
/// [model]
/// batch-size = 4
/// seed = 7
///
/// [scoring]
/// command = "python3"
/// args = ["score.py"]
/// ```
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialSearchConfig {
    pub initial_observations: Option<PathBuf>,
    pub steps: Option<u64>,
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub generator: GeneratorConfigFile,
    #[serde(default)]
    pub model: RandomSearchOptions,
    pub scoring: Option<ScoringSection>,
}

/// A fully resolved search; relative paths have been anchored at the config file's directory.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub initial_observations: PathBuf,
    pub steps: u64,
    pub output: PathBuf,
    pub generator: GeneratorConfig,
    pub model: RandomSearchOptions,
    pub scoring: ScoringSection,
    pub base_dir: PathBuf,
}

impl PartialSearchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading search configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(self, args: &RunArgs, base_dir: &Path) -> Result<SearchConfig> {
        let initial_observations = self.initial_observations.ok_or_else(|| {
            CliError::Config("Missing required parameter: initial-observations".to_string())
        })?;
        let scoring = self.scoring.ok_or_else(|| {
            CliError::Config("Missing required section: [scoring]".to_string())
        })?;
        if scoring.command.trim().is_empty() {
            return Err(CliError::Config(
                "scoring.command must not be empty".to_string(),
            ));
        }

        let mut model = self.model;
        if let Some(seed) = args.seed {
            model.seed = Some(seed);
        }

        let output = args
            .output
            .clone()
            .or(self.output)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        Ok(SearchConfig {
            initial_observations: anchor(base_dir, initial_observations),
            steps: args.steps.or(self.steps).unwrap_or(DEFAULT_STEPS),
            // Output given on the command line stays relative to the working directory.
            output: if args.output.is_some() {
                output
            } else {
                anchor(base_dir, output)
            },
            generator: self.generator.into_config()?,
            model,
            scoring,
            base_dir: base_dir.to_path_buf(),
        })
    }
}

fn anchor(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
