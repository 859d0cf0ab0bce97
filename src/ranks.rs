//! Turning an engine outcome into per-player ranks.
//!
//! Ranks are 1-based and indexed by roster position, so `ranks[i]` is the
//! reproduced rank of the player reported at rank `i + 1`. A perfect
//! reproduction is therefore `[1, 2, 3, ...]`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::TournamentOutcome;

/// Which ranking of an outcome is being looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankVariant {
    /// Ordered by mean payoff over every match including self-play.
    SelfInteraction,
    /// The engine's own ranking, which leaves out self-play.
    NoSelfInteraction,
}

impl RankVariant {
    /// Order in which variants are written for each seed.
    pub const ALL: [RankVariant; 2] = [RankVariant::SelfInteraction, RankVariant::NoSelfInteraction];

    /// Value of the `self_interaction` column.
    pub fn as_csv(&self) -> &'static str {
        match self {
            RankVariant::SelfInteraction => "True",
            RankVariant::NoSelfInteraction => "False",
        }
    }

    pub fn from_csv(field: &str) -> Option<Self> {
        match field.trim() {
            "True" | "true" | "1" => Some(RankVariant::SelfInteraction),
            "False" | "false" | "0" => Some(RankVariant::NoSelfInteraction),
            _ => None,
        }
    }
}

impl fmt::Display for RankVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankVariant::SelfInteraction => write!(f, "self-interaction"),
            RankVariant::NoSelfInteraction => write!(f, "no-self-interaction"),
        }
    }
}

impl FromStr for RankVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self-interaction" => Ok(RankVariant::SelfInteraction),
            "no-self-interaction" => Ok(RankVariant::NoSelfInteraction),
            other => Err(format!(
                "unknown rank variant {other:?}, expected self-interaction or no-self-interaction"
            )),
        }
    }
}

/// Both rankings derived from a single outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rankings {
    pub self_interaction: Vec<usize>,
    pub no_self_interaction: Vec<usize>,
}

impl Rankings {
    pub fn from_outcome(outcome: &TournamentOutcome) -> Self {
        Self {
            self_interaction: self_interaction_ranks(&outcome.payoff_matrix),
            no_self_interaction: no_self_interaction_ranks(&outcome.ranking),
        }
    }

    pub fn get(&self, variant: RankVariant) -> &[usize] {
        match variant {
            RankVariant::SelfInteraction => &self.self_interaction,
            RankVariant::NoSelfInteraction => &self.no_self_interaction,
        }
    }
}

/// Rank players by the mean of their payoff row, highest first.
///
/// Tied players share the average of the ranks they span, truncated to an
/// integer: two players tied for second and third both get rank 2.
pub fn self_interaction_ranks(payoff_matrix: &[Vec<f64>]) -> Vec<usize> {
    let means: Vec<f64> = payoff_matrix
        .iter()
        .map(|row| {
            if row.is_empty() {
                0.0
            } else {
                row.iter().sum::<f64>() / row.len() as f64
            }
        })
        .collect();

    let mut order: Vec<usize> = (0..means.len()).collect();
    order.sort_by(|&a, &b| {
        means[b]
            .partial_cmp(&means[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0; means.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && means[order[end]] == means[order[start]] {
            end += 1;
        }
        // Positions start..end hold 1-based ranks start+1..=end.
        let shared = (start + 1 + end) / 2;
        for &player_idx in &order[start..end] {
            ranks[player_idx] = shared;
        }
        start = end;
    }

    ranks
}

/// Invert an engine ranking (player indices, best first) into ranks.
pub fn no_self_interaction_ranks(ranking: &[usize]) -> Vec<usize> {
    let mut ranks = vec![0; ranking.len()];
    for (position, &player_idx) in ranking.iter().enumerate() {
        if let Some(rank) = ranks.get_mut(player_idx) {
            *rank = position + 1;
        }
    }
    ranks
}

/// Count players whose reproduced rank equals their reported rank.
pub fn count_matches(ranks: &[usize]) -> usize {
    ranks
        .iter()
        .enumerate()
        .filter(|(reported, reproduced)| reported + 1 == **reproduced)
        .count()
}
