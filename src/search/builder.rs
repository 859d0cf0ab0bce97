use std::path::{Path, PathBuf};

use super::config::SearchConfig;
use super::error::Result;
use super::runner::SeedSearch;
use crate::engine::TournamentEngine;
use crate::ranks::RankVariant;
use crate::roster::Roster;

/// Builder for constructing SeedSearch instances
///
/// Anything not set falls back to the base [`SearchConfig`] (the default one
/// unless [`SearchBuilder::config`] was called) and to
/// [`Roster::axelrod_first_tournament`].
///
/// # Example
///
/// ```ignore
/// use rank_repro::search::SearchBuilder;
///
/// let search = SearchBuilder::new()
///     .results_path("main.csv")
///     .turns(200)
///     .repetitions(5)
///     .max_seeds(10_000)
///     .build(engine)?;
/// ```
#[derive(Debug, Default)]
pub struct SearchBuilder {
    base: Option<SearchConfig>,
    roster: Option<Roster>,
    results_path: Option<PathBuf>,
    start_seed: Option<u64>,
    max_seeds: Option<u64>,
    turns: Option<u32>,
    repetitions: Option<u32>,
    target: Option<RankVariant>,
    verify_reproducibility: Option<bool>,
}

impl SearchBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration instead of the defaults
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// Set the players, in reported rank order
    pub fn roster(mut self, roster: Roster) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Set the CSV file results are appended to
    pub fn results_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.results_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the first seed used when the results file is empty
    pub fn start_seed(mut self, seed: u64) -> Self {
        self.start_seed = Some(seed);
        self
    }

    /// Limit how many seeds a single run checks
    pub fn max_seeds(mut self, max_seeds: u64) -> Self {
        self.max_seeds = Some(max_seeds);
        self
    }

    /// Set the number of turns per match
    pub fn turns(mut self, turns: u32) -> Self {
        self.turns = Some(turns);
        self
    }

    /// Set the number of repetitions of each match
    pub fn repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    /// Set which ranking must match to end the search
    pub fn target(mut self, target: RankVariant) -> Self {
        self.target = Some(target);
        self
    }

    /// Enable or disable playing each seed twice
    pub fn verify_reproducibility(mut self, verify: bool) -> Self {
        self.verify_reproducibility = Some(verify);
        self
    }

    /// Build the search around `engine`
    pub fn build<E: TournamentEngine>(self, engine: E) -> Result<SeedSearch<E>> {
        let mut config = self.base.unwrap_or_default();

        if let Some(path) = self.results_path {
            config.results_path = path;
        }
        if let Some(seed) = self.start_seed {
            config.start_seed = seed;
        }
        if let Some(max_seeds) = self.max_seeds {
            config.max_seeds = Some(max_seeds);
        }
        if let Some(turns) = self.turns {
            config.settings.turns = turns;
        }
        if let Some(repetitions) = self.repetitions {
            config.settings.repetitions = repetitions;
        }
        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(verify) = self.verify_reproducibility {
            config.verify_reproducibility = verify;
        }

        config.validate()?;

        let roster = self.roster.unwrap_or_default();
        Ok(SeedSearch::new(config, roster, engine))
    }
}
