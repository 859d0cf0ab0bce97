use thiserror::Error;

use crate::engine::EngineError;
use crate::results::LogError;

/// Errors that can occur during a seed search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Results log error: {0}")]
    Log(#[from] LogError),

    #[error("Failed to reproduce for seed={seed}")]
    NotReproducible { seed: u64 },

    #[error("Failed to read config file {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config from {path}: {source}")]
    ParseConfig {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Seed space exhausted after seed {0}")]
    SeedOverflow(u64),
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
