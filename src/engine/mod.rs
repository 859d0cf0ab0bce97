//! The boundary to the tournament simulation.
//!
//! Payoff computation and strategy play are not done here. An engine takes a
//! [`Roster`], the [`TournamentSettings`] and a seed, and hands back a
//! [`TournamentOutcome`]. Everything downstream only looks at the outcome.
//!
//! Any `FnMut(&Roster, &TournamentSettings, u64) -> Result<TournamentOutcome,
//! EngineError>` is an engine, which keeps tests and one-off experiments
//! short. [`CommandEngine`] drives an external program.

mod command;

pub use command::CommandEngine;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roster::Roster;

/// Errors raised while obtaining a tournament outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start engine {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine {program:?} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Failed to encode engine request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Engine {program:?} produced unreadable output: {source}; stderr: {stderr}")]
    Decode {
        program: String,
        stderr: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Engine {program:?} returned an invalid outcome: {reason}; stderr: {stderr}")]
    BadOutcome {
        program: String,
        stderr: String,
        reason: String,
    },

    #[error("Engine outcome is invalid: {0}")]
    InvalidOutcome(String),
}

/// Match parameters passed through to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentSettings {
    /// Turns per match
    pub turns: u32,
    /// Times every match is repeated
    pub repetitions: u32,
}

impl Default for TournamentSettings {
    /// 200 turns and 5 repetitions, as in the first tournament.
    fn default() -> Self {
        Self {
            turns: 200,
            repetitions: 5,
        }
    }
}

/// What the engine reports for a single seeded tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentOutcome {
    /// `payoff_matrix[i][j]` is the mean per-turn payoff of player `i`
    /// against player `j`. The diagonal holds self-play payoffs.
    pub payoff_matrix: Vec<Vec<f64>>,
    /// Player indices from first to last, ranked without self interactions.
    pub ranking: Vec<usize>,
}

impl TournamentOutcome {
    /// Check the outcome describes exactly `num_players` players.
    pub fn validate(&self, num_players: usize) -> Result<(), EngineError> {
        if self.payoff_matrix.len() != num_players {
            return Err(EngineError::InvalidOutcome(format!(
                "payoff matrix has {} rows, expected {}",
                self.payoff_matrix.len(),
                num_players
            )));
        }
        for (idx, row) in self.payoff_matrix.iter().enumerate() {
            if row.len() != num_players {
                return Err(EngineError::InvalidOutcome(format!(
                    "payoff matrix row {} has {} columns, expected {}",
                    idx,
                    row.len(),
                    num_players
                )));
            }
            if row.iter().any(|p| !p.is_finite()) {
                return Err(EngineError::InvalidOutcome(format!(
                    "payoff matrix row {idx} contains a non-finite payoff"
                )));
            }
        }

        if self.ranking.len() != num_players {
            return Err(EngineError::InvalidOutcome(format!(
                "ranking has {} entries, expected {}",
                self.ranking.len(),
                num_players
            )));
        }
        let mut seen = vec![false; num_players];
        for &player_idx in &self.ranking {
            match seen.get_mut(player_idx) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(EngineError::InvalidOutcome(format!(
                        "player {player_idx} appears twice in ranking"
                    )));
                }
                None => {
                    return Err(EngineError::InvalidOutcome(format!(
                        "ranking refers to unknown player {player_idx}"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Something that can play a seeded tournament.
///
/// Implementations must be deterministic in `seed`: the search relies on a
/// seed reproducing the same outcome when played twice.
pub trait TournamentEngine {
    fn play(
        &mut self,
        roster: &Roster,
        settings: &TournamentSettings,
        seed: u64,
    ) -> Result<TournamentOutcome, EngineError>;
}

impl<F> TournamentEngine for F
where
    F: FnMut(&Roster, &TournamentSettings, u64) -> Result<TournamentOutcome, EngineError>,
{
    fn play(
        &mut self,
        roster: &Roster,
        settings: &TournamentSettings,
        seed: u64,
    ) -> Result<TournamentOutcome, EngineError> {
        self(roster, settings, seed)
    }
}
