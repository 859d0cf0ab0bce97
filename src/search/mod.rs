//! Seed search for a reproduced ranking
//!
//! Seeds are checked one after another. Each seed is played (twice, to make
//! sure the engine is deterministic), both rankings are appended to the
//! results file, and the search stops once the target ranking puts every
//! player on their reported rank.
//!
//! # Example
//!
//! ```ignore
//! use rank_repro::engine::CommandEngine;
//! use rank_repro::search::{SearchBuilder, SearchOutcome};
//!
//! let mut search = SearchBuilder::new()
//!     .results_path("main.csv")
//!     .max_seeds(10_000)
//!     .build(CommandEngine::new("python3").arg("axelrod_engine.py"))?;
//!
//! match search.run()? {
//!     SearchOutcome::Found { seed, .. } => println!("seed {seed} reproduces the paper"),
//!     outcome => println!("{outcome}"),
//! }
//! ```

mod builder;
mod config;
mod error;
mod runner;

pub use builder::SearchBuilder;
pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use runner::{SearchOutcome, SeedReport, SeedSearch};
