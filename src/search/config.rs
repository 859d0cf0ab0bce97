use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{Result, SearchError};
use crate::engine::TournamentSettings;
use crate::ranks::RankVariant;

/// Configuration for a seed search
///
/// Every field has a default, so a JSON config file only needs the fields it
/// changes:
///
/// ```json
/// {"results_path": "runs/main.csv", "max_seeds": 1000, "target": "self-interaction"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// CSV file that rows are appended to
    pub results_path: PathBuf,
    /// First seed when the results file holds no rows yet
    pub start_seed: u64,
    /// Stop after checking this many seeds in one run
    pub max_seeds: Option<u64>,
    /// Turns and repetitions handed to the engine
    #[serde(flatten)]
    pub settings: TournamentSettings,
    /// Ranking that has to match the roster exactly to stop the search
    pub target: RankVariant,
    /// Play every seed twice and fail if the rankings differ
    pub verify_reproducibility: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from("main.csv"),
            start_seed: 0,
            max_seeds: None,
            settings: TournamentSettings::default(),
            target: RankVariant::NoSelfInteraction,
            verify_reproducibility: true,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SearchError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SearchError::ParseConfig {
            path: path.display().to_string(),
            source,
        })
    }

    /// Validate the search configuration
    pub fn validate(&self) -> Result<()> {
        if self.results_path.as_os_str().is_empty() {
            return Err(SearchError::ValidationError(
                "results_path must not be empty".to_string(),
            ));
        }

        if self.settings.turns == 0 {
            return Err(SearchError::ValidationError(
                "turns must be greater than 0".to_string(),
            ));
        }

        if self.settings.repetitions == 0 {
            return Err(SearchError::ValidationError(
                "repetitions must be greater than 0".to_string(),
            ));
        }

        if self.max_seeds == Some(0) {
            return Err(SearchError::ValidationError(
                "max_seeds must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}
