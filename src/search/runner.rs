use std::fmt;

use tracing::{debug, event, info, instrument, warn};

use super::config::SearchConfig;
use super::error::{Result, SearchError};
use crate::engine::TournamentEngine;
use crate::ranks::{count_matches, RankVariant, Rankings};
use crate::results::{ResultsLog, SeedRecord};
use crate::roster::Roster;

/// Log a progress line every this many seeds.
const LOG_INTERVAL: u64 = 100;

/// What a single seed produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub seed: u64,
    pub rankings: Rankings,
    /// Players on their reported rank, with self interactions
    pub self_interaction_matches: usize,
    /// Players on their reported rank, without self interactions
    pub no_self_interaction_matches: usize,
}

impl SeedReport {
    pub fn matches(&self, variant: RankVariant) -> usize {
        match variant {
            RankVariant::SelfInteraction => self.self_interaction_matches,
            RankVariant::NoSelfInteraction => self.no_self_interaction_matches,
        }
    }
}

/// How a search run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// `seed` reproduces the reported ranking exactly.
    Found { seed: u64, seeds_checked: u64 },
    /// The seed limit was reached without an exact match.
    Exhausted {
        last_seed: u64,
        seeds_checked: u64,
        /// Seed with the most matches in this run, and that count
        best: Option<(u64, usize)>,
    },
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Found {
                seed,
                seeds_checked,
            } => write!(
                f,
                "seed {seed} reproduces the reported ranking ({seeds_checked} seeds checked)"
            ),
            SearchOutcome::Exhausted {
                last_seed,
                seeds_checked,
                best,
            } => {
                write!(
                    f,
                    "no exact match after {seeds_checked} seeds (last seed {last_seed})"
                )?;
                if let Some((seed, matches)) = best {
                    write!(f, ", best was seed {seed} with {matches} matches")?;
                }
                Ok(())
            }
        }
    }
}

/// Linear search over seeds for one that reproduces the roster's order.
///
/// Build one with [`super::SearchBuilder`].
pub struct SeedSearch<E> {
    config: SearchConfig,
    roster: Roster,
    engine: E,
    log: Option<ResultsLog>,
}

impl<E: TournamentEngine> SeedSearch<E> {
    pub(crate) fn new(config: SearchConfig, roster: Roster, engine: E) -> Self {
        Self {
            config,
            roster,
            engine,
            log: None,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Get the roster
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Consume the search and give the engine back.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Play `seed`, record both rankings and report the matches.
    ///
    /// When reproducibility is verified, a seed whose second play disagrees
    /// with the first is rejected and nothing is written for it.
    #[instrument(level = "debug", skip(self))]
    pub fn check_seed(&mut self, seed: u64) -> Result<SeedReport> {
        let rankings = self.play(seed)?;

        if self.config.verify_reproducibility && self.play(seed)? != rankings {
            warn!(seed, "Engine is not deterministic for this seed");
            return Err(SearchError::NotReproducible { seed });
        }

        let records: Vec<SeedRecord> = RankVariant::ALL
            .into_iter()
            .map(|variant| {
                let ranks = rankings.get(variant).to_vec();
                SeedRecord {
                    seed,
                    number: count_matches(&ranks),
                    variant,
                    ranks,
                }
            })
            .collect();
        self.log()?.append_all(&records)?;

        let report = SeedReport {
            seed,
            self_interaction_matches: count_matches(&rankings.self_interaction),
            no_self_interaction_matches: count_matches(&rankings.no_self_interaction),
            rankings,
        };
        debug!(
            seed,
            self_interaction = report.self_interaction_matches,
            no_self_interaction = report.no_self_interaction_matches,
            "Checked seed"
        );
        Ok(report)
    }

    /// Check seeds from where the results file left off until one matches
    /// exactly or the seed limit is hit.
    pub fn run(&mut self) -> Result<SearchOutcome> {
        let num_players = self.roster.len();
        let target = self.config.target;
        let mut seed = self.log()?.next_seed();

        event!(
            tracing::Level::INFO,
            num_players,
            first_seed = seed,
            max_seeds = ?self.config.max_seeds,
            %target,
            turns = self.config.settings.turns,
            repetitions = self.config.settings.repetitions,
            "Starting seed search"
        );

        let mut seeds_checked = 0;
        let mut best: Option<(u64, usize)> = None;

        loop {
            let report = self.check_seed(seed)?;
            seeds_checked += 1;

            let matches = report.matches(target);
            if best.map_or(true, |(_, most)| matches > most) {
                info!(seed, matches, num_players, "New best seed");
                best = Some((seed, matches));
            }

            if matches == num_players {
                info!(seed, seeds_checked, "Found reproducing seed");
                return Ok(SearchOutcome::Found {
                    seed,
                    seeds_checked,
                });
            }

            if seeds_checked % LOG_INTERVAL == 0 {
                info!(seed, seeds_checked, "Search progress");
            }

            if self.config.max_seeds.is_some_and(|max| seeds_checked >= max) {
                info!(seeds_checked, last_seed = seed, "Seed limit reached");
                return Ok(SearchOutcome::Exhausted {
                    last_seed: seed,
                    seeds_checked,
                    best,
                });
            }

            seed = seed.checked_add(1).ok_or(SearchError::SeedOverflow(seed))?;
        }
    }

    fn play(&mut self, seed: u64) -> Result<Rankings> {
        let outcome = self
            .engine
            .play(&self.roster, &self.config.settings, seed)?;
        outcome.validate(self.roster.len())?;
        Ok(Rankings::from_outcome(&outcome))
    }

    fn log(&mut self) -> Result<&mut ResultsLog> {
        let log = match self.log.take() {
            Some(log) => log,
            None => ResultsLog::open_or_create(
                &self.config.results_path,
                &self.roster,
                self.config.start_seed,
            )?,
        };
        Ok(self.log.insert(log))
    }
}

impl<E> fmt::Debug for SeedSearch<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedSearch")
            .field("config", &self.config)
            .field("roster", &self.roster)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::engine::{EngineError, TournamentOutcome, TournamentSettings};
    use crate::results::{read_records, LogError};
    use crate::search::SearchBuilder;

    /// Outcome whose engine ranking puts player `first` on top and keeps the
    /// rest in roster order. The payoff matrix always ranks in roster order.
    fn outcome_with_leader(n: usize, first: usize) -> TournamentOutcome {
        let payoff_matrix = (0..n)
            .map(|i| vec![(n - i) as f64; n])
            .collect::<Vec<_>>();
        let mut ranking = vec![first];
        ranking.extend((0..n).filter(|&i| i != first));
        TournamentOutcome {
            payoff_matrix,
            ranking,
        }
    }

    /// Engine that reproduces the roster order only at `winning_seed`.
    fn engine_matching_at(
        winning_seed: u64,
    ) -> impl FnMut(&Roster, &TournamentSettings, u64) -> std::result::Result<TournamentOutcome, EngineError>
    {
        move |roster: &Roster, _: &TournamentSettings, seed: u64| {
            let n = roster.len();
            let first = if seed == winning_seed { 0 } else { n - 1 };
            Ok(outcome_with_leader(n, first))
        }
    }

    fn roster() -> Roster {
        Roster::new(["A", "B", "C"]).unwrap()
    }

    #[test]
    fn test_check_seed_writes_both_variants() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.csv");
        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(&path)
            .build(engine_matching_at(4))
            .unwrap();

        let report = search.check_seed(0).unwrap();
        assert_eq!(report.self_interaction_matches, 3);
        // Engine ranking [2, 0, 1] gives ranks [2, 3, 1].
        assert_eq!(report.rankings.no_self_interaction, vec![2, 3, 1]);
        assert_eq!(report.no_self_interaction_matches, 0);

        let (_, records) = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].variant, RankVariant::SelfInteraction);
        assert_eq!(records[0].number, 3);
        assert_eq!(records[1].variant, RankVariant::NoSelfInteraction);
        assert_eq!(records[1].number, 0);
    }

    #[test]
    fn test_run_stops_at_matching_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.csv");
        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(&path)
            .build(engine_matching_at(4))
            .unwrap();

        let outcome = search.run().unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Found {
                seed: 4,
                seeds_checked: 5
            }
        );

        let (_, records) = read_records(&path).unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(records.last().unwrap().seed, 4);
    }

    #[test]
    fn test_run_self_interaction_target_stops_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(dir.path().join("main.csv"))
            .target(RankVariant::SelfInteraction)
            .build(engine_matching_at(4))
            .unwrap();

        assert!(matches!(
            search.run().unwrap(),
            SearchOutcome::Found { seed: 0, .. }
        ));
    }

    #[test]
    fn test_run_respects_max_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(dir.path().join("main.csv"))
            .max_seeds(3)
            .build(engine_matching_at(10))
            .unwrap();

        match search.run().unwrap() {
            SearchOutcome::Exhausted {
                last_seed,
                seeds_checked,
                best,
            } => {
                assert_eq!(last_seed, 2);
                assert_eq!(seeds_checked, 3);
                assert_eq!(best, Some((0, 0)));
            }
            other => panic!("expected exhausted search, got {other:?}"),
        }
    }

    #[test]
    fn test_run_resumes_after_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.csv");

        let mut first = SearchBuilder::new()
            .roster(roster())
            .results_path(&path)
            .max_seeds(2)
            .build(engine_matching_at(3))
            .unwrap();
        assert!(!first.run().unwrap().is_found());

        let mut second = SearchBuilder::new()
            .roster(roster())
            .results_path(&path)
            .build(engine_matching_at(3))
            .unwrap();
        assert_eq!(
            second.run().unwrap(),
            SearchOutcome::Found {
                seed: 3,
                seeds_checked: 2
            }
        );

        let seeds: Vec<u64> = read_records(&path)
            .unwrap()
            .1
            .iter()
            .map(|r| r.seed)
            .collect();
        assert_eq!(seeds, vec![0, 0, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_start_seed_used_for_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(dir.path().join("main.csv"))
            .start_seed(7)
            .build(engine_matching_at(9))
            .unwrap();

        assert_eq!(
            search.run().unwrap(),
            SearchOutcome::Found {
                seed: 9,
                seeds_checked: 3
            }
        );
    }

    #[test]
    fn test_last_seed_ends_search_without_wrapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.csv");
        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(&path)
            .start_seed(u64::MAX)
            .build(engine_matching_at(0))
            .unwrap();

        assert!(matches!(
            search.run(),
            Err(SearchError::SeedOverflow(u64::MAX))
        ));
        let seeds: Vec<u64> = read_records(&path)
            .unwrap()
            .1
            .iter()
            .map(|r| r.seed)
            .collect();
        assert_eq!(seeds, vec![u64::MAX, u64::MAX]);

        let mut resumed = SearchBuilder::new()
            .roster(roster())
            .results_path(&path)
            .build(engine_matching_at(0))
            .unwrap();
        assert!(matches!(
            resumed.run(),
            Err(SearchError::Log(LogError::SeedSpaceExhausted(u64::MAX)))
        ));
    }

    #[test]
    fn test_non_deterministic_engine_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.csv");
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        let flaky = move |roster: &Roster, _: &TournamentSettings, _: u64| {
            counter.set(counter.get() + 1);
            Ok::<_, EngineError>(outcome_with_leader(roster.len(), counter.get() % roster.len()))
        };

        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(&path)
            .build(flaky)
            .unwrap();

        assert!(matches!(
            search.check_seed(0),
            Err(SearchError::NotReproducible { seed: 0 })
        ));
        assert_eq!(calls.get(), 2);
        // The header is never written when no row could be.
        assert!(!path.exists());
    }

    #[test]
    fn test_verification_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        let engine = move |roster: &Roster, _: &TournamentSettings, _: u64| {
            counter.set(counter.get() + 1);
            Ok::<_, EngineError>(outcome_with_leader(roster.len(), 0))
        };

        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(dir.path().join("main.csv"))
            .verify_reproducibility(false)
            .build(engine)
            .unwrap();

        search.check_seed(0).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_engine_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let failing = |_: &Roster, _: &TournamentSettings, _: u64| {
            Err::<TournamentOutcome, _>(EngineError::InvalidOutcome("boom".to_string()))
        };

        let mut search = SearchBuilder::new()
            .roster(roster())
            .results_path(dir.path().join("main.csv"))
            .build(failing)
            .unwrap();

        assert!(matches!(search.run(), Err(SearchError::Engine(_))));
    }

    #[test]
    fn test_outcome_display() {
        let found = SearchOutcome::Found {
            seed: 12,
            seeds_checked: 13,
        };
        assert_eq!(
            found.to_string(),
            "seed 12 reproduces the reported ranking (13 seeds checked)"
        );

        let exhausted = SearchOutcome::Exhausted {
            last_seed: 9,
            seeds_checked: 10,
            best: Some((3, 11)),
        };
        assert_eq!(
            exhausted.to_string(),
            "no exact match after 10 seeds (last seed 9), best was seed 3 with 11 matches"
        );
    }
}
