//! # rank_repro
//!
//! Search tournament seeds until a reproduced round-robin ranking matches a
//! previously reported one.
//!
//! Each seed is handed to an external [`engine::TournamentEngine`], the
//! returned payoffs are turned into [`ranks::Rankings`], compared against the
//! order of the [`roster::Roster`], and appended to a CSV
//! [`results::ResultsLog`]. The search resumes from the highest seed already
//! on disk, so it can be stopped and restarted freely.
//!
//! ```ignore
//! use rank_repro::engine::CommandEngine;
//! use rank_repro::roster::Roster;
//! use rank_repro::search::SearchBuilder;
//!
//! let mut search = SearchBuilder::new()
//!     .roster(Roster::axelrod_first_tournament())
//!     .results_path("main.csv")
//!     .build(CommandEngine::new("python3").arg("engine.py"))?;
//!
//! let outcome = search.run()?;
//! println!("{outcome}");
//! ```

pub mod engine;
pub mod ranks;
pub mod results;
pub mod roster;
pub mod search;
pub mod summary;
