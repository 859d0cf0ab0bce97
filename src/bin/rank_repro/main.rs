use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rank_repro::engine::CommandEngine;
use rank_repro::ranks::RankVariant;
use rank_repro::roster::Roster;
use rank_repro::search::{SearchBuilder, SearchConfig, SearchOutcome};
use rank_repro::summary::Summary;
use tracing::error;

mod tracing_args;

use tracing_args::TracingArgs;

#[derive(Parser, Debug)]
#[command(
    name = "rank_repro",
    about = "Search tournament seeds until the reported ranking is reproduced",
    long_about = "Plays the tournament once per seed through an external engine, compares the\n\
                  reproduced ranking against the reported one and appends every seed to a CSV\n\
                  file. Restarting resumes after the last recorded seed.\n\n\
                  Example:\n  rank_repro --engine python3 -- axelrod_engine.py\n  rank_repro -s"
)]
struct Args {
    /// Summarise the results file instead of searching
    #[arg(short = 's', long = "summarise", visible_alias = "summarize")]
    summarise: bool,

    /// Print the summary as Markdown
    #[arg(long = "markdown", requires = "summarise", conflicts_with = "json")]
    markdown: bool,

    /// Print the summary as JSON
    #[arg(long = "json", requires = "summarise")]
    json: bool,

    /// Program that plays one tournament per invocation
    #[arg(short = 'e', long = "engine", required_unless_present = "summarise")]
    engine: Option<String>,

    /// Working directory for the engine program
    #[arg(long = "engine-dir")]
    engine_dir: Option<PathBuf>,

    /// Arguments passed to the engine program
    #[arg(last = true)]
    engine_args: Vec<String>,

    /// JSON search configuration file; flags below override it
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Players in reported rank order, as a JSON file or inline JSON array
    #[arg(short = 'r', long = "roster")]
    roster: Option<String>,

    /// CSV file that results are appended to [default: main.csv]
    #[arg(short = 'o', long = "results")]
    results: Option<PathBuf>,

    /// First seed when the results file has no rows
    #[arg(long = "start-seed")]
    start_seed: Option<u64>,

    /// Stop after checking this many seeds
    #[arg(short = 'n', long = "max-seeds")]
    max_seeds: Option<u64>,

    /// Turns per match [default: 200]
    #[arg(long = "turns")]
    turns: Option<u32>,

    /// Repetitions of each match [default: 5]
    #[arg(long = "repetitions")]
    repetitions: Option<u32>,

    /// Ranking that must match exactly: self-interaction or no-self-interaction
    #[arg(long = "target")]
    target: Option<RankVariant>,

    /// Play each seed once instead of twice
    #[arg(long = "no-verify")]
    no_verify: bool,

    #[command(flatten)]
    tracing: TracingArgs,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    args.tracing.init_tracing();

    let result = if args.summarise {
        summarise(&args).map(|()| ExitCode::SUCCESS)
    } else {
        search(&args).map(|outcome| {
            println!("{outcome}");
            if outcome.is_found() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        })
    };

    result.unwrap_or_else(|e| {
        error!("{e}");
        eprintln!("Error: {e}");
        ExitCode::FAILURE
    })
}

fn load_config(args: &Args) -> Result<SearchConfig, Box<dyn std::error::Error>> {
    Ok(match &args.config {
        Some(path) => SearchConfig::from_file(path)?,
        None => SearchConfig::default(),
    })
}

fn search(args: &Args) -> Result<SearchOutcome, Box<dyn std::error::Error>> {
    let roster = match &args.roster {
        Some(input) => Roster::from_str_or_file(input)?,
        None => Roster::axelrod_first_tournament(),
    };

    let program = args
        .engine
        .as_deref()
        .ok_or("--engine is required to run a search")?;
    let mut engine = CommandEngine::new(program).args(&args.engine_args);
    if let Some(dir) = &args.engine_dir {
        engine = engine.current_dir(dir);
    }

    let mut builder = SearchBuilder::new().config(load_config(args)?).roster(roster);
    if let Some(path) = &args.results {
        builder = builder.results_path(path);
    }
    if let Some(seed) = args.start_seed {
        builder = builder.start_seed(seed);
    }
    if let Some(max_seeds) = args.max_seeds {
        builder = builder.max_seeds(max_seeds);
    }
    if let Some(turns) = args.turns {
        builder = builder.turns(turns);
    }
    if let Some(repetitions) = args.repetitions {
        builder = builder.repetitions(repetitions);
    }
    if let Some(target) = args.target {
        builder = builder.target(target);
    }
    if args.no_verify {
        builder = builder.verify_reproducibility(false);
    }

    let mut search = builder.build(engine)?;
    Ok(search.run()?)
}

fn summarise(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let path = match &args.results {
        Some(path) => path.clone(),
        None => load_config(args)?.results_path,
    };
    let summary = Summary::from_file(&path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if args.markdown {
        print!("{}", summary.to_markdown());
    } else {
        print!("{summary}");
    }
    Ok(())
}
