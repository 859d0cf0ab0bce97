//! Tournament participants ordered by their reported rank.
//!
//! A [`Roster`] is both the list of players handed to the engine and the
//! reference ranking: the player at index `i` was reported at rank `i + 1`.
//!
//! Rosters can be written as a JSON array of names:
//!
//! ```json
//! ["Tit For Tat", "Grudger", "Random: 0.5"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building or loading a roster.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster must contain at least one player")]
    Empty,

    #[error("Player at position {0} has an empty name")]
    EmptyName(usize),

    #[error("Player {0:?} appears more than once")]
    Duplicate(String),

    #[error("Failed to read roster file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse roster JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Roster file {0:?} does not exist")]
    NotFound(String),
}

/// A single tournament participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Player {
    pub name: String,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Participants in reported rank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Build a roster from names listed best to worst.
    pub fn new<I, S>(names: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let players: Vec<Player> = names.into_iter().map(Player::new).collect();
        if players.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut seen = HashSet::with_capacity(players.len());
        for (idx, player) in players.iter().enumerate() {
            if player.name.trim().is_empty() {
                return Err(RosterError::EmptyName(idx));
            }
            if !seen.insert(player.name.as_str()) {
                return Err(RosterError::Duplicate(player.name.clone()));
            }
        }

        Ok(Self { players })
    }

    /// The strategies of Axelrod's first tournament, as named by the Axelrod
    /// library, in the order they were reported to finish.
    pub fn axelrod_first_tournament() -> Self {
        Self {
            players: AXELROD_FIRST_TOURNAMENT
                .iter()
                .copied()
                .map(Player::new)
                .collect(),
        }
    }

    /// Parse a JSON array of names.
    pub fn from_json(json: &str) -> Result<Self, RosterError> {
        let names: Vec<String> = serde_json::from_str(json)?;
        Self::new(names)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RosterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Read `input` as a file if one exists at that path, as inline JSON if
    /// it starts with `[`, and report a missing file otherwise.
    pub fn from_str_or_file(input: &str) -> Result<Self, RosterError> {
        if Path::new(input).is_file() {
            Self::from_file(input)
        } else if input.trim_start().starts_with('[') {
            Self::from_json(input)
        } else {
            Err(RosterError::NotFound(input.to_string()))
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.players.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// 1-based reported rank of `name`.
    pub fn reported_rank(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name == name).map(|i| i + 1)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::axelrod_first_tournament()
    }
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        Roster::new(names).map_err(serde::de::Error::custom)
    }
}

const AXELROD_FIRST_TOURNAMENT: [&str; 15] = [
    "Tit For Tat",
    "First by Tideman and Chieruzzi: (D, D)",
    "First by Nydegger",
    "First by Grofman",
    "First by Shubik",
    "First by Stein and Rapoport: 0.05: (D, D)",
    "Grudger",
    "First by Davis: 10",
    "First by Graaskamp: 0.05",
    "First by Downing",
    "First by Feld: 1.0, 0.5, 200",
    "First by Joss: 0.9",
    "First by Tullock",
    "First by Anonymous",
    "Random: 0.5",
];
