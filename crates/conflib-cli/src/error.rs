use conflib::core::BoxedError;
use conflib::engine::config::ConfigError;
use conflib::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error(transparent)]
    CoreConfig(#[from] ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: BoxedError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
