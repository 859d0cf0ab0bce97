use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Serialize;
use tracing::{debug, instrument, trace};

use super::{EngineError, TournamentEngine, TournamentOutcome, TournamentSettings};
use crate::roster::Roster;

/// Request written to the engine's stdin.
#[derive(Debug, Serialize)]
struct EngineRequest<'a> {
    players: Vec<&'a str>,
    turns: u32,
    repetitions: u32,
    seed: u64,
}

/// Runs an external program once per tournament.
///
/// The program receives one JSON object on stdin:
///
/// ```json
/// {"players": ["Tit For Tat", "Grudger"], "turns": 200, "repetitions": 5, "seed": 0}
/// ```
///
/// and must print a [`TournamentOutcome`] as JSON on stdout:
///
/// ```json
/// {"payoff_matrix": [[3.0, 3.0], [3.0, 3.0]], "ranking": [0, 1]}
/// ```
///
/// A non-zero exit status is reported together with whatever the program
/// wrote to stderr.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl CommandEngine {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the program from `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl TournamentEngine for CommandEngine {
    #[instrument(level = "debug", skip(self, roster), fields(program = ?self.program, players = roster.len()))]
    fn play(
        &mut self,
        roster: &Roster,
        settings: &TournamentSettings,
        seed: u64,
    ) -> Result<TournamentOutcome, EngineError> {
        let request = EngineRequest {
            players: roster.names().collect(),
            turns: settings.turns,
            repetitions: settings.repetitions,
            seed,
        };
        let payload = serde_json::to_vec(&request)?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| EngineError::Spawn {
            program: self.program_name(),
            source,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that ignores its input may already be gone.
            match stdin.write_all(&payload) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    trace!("engine closed stdin before reading the request");
                }
                other => other?,
            }
        }

        let output = child.wait_with_output()?;
        debug!(
            status = %output.status,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Engine finished"
        );

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(EngineError::Failed {
                program: self.program_name(),
                status: output.status,
                stderr,
            });
        }

        let outcome: TournamentOutcome =
            serde_json::from_slice(&output.stdout).map_err(|source| EngineError::Decode {
                program: self.program_name(),
                stderr: stderr.clone(),
                source,
            })?;
        outcome
            .validate(roster.len())
            .map_err(|e| match e {
                EngineError::InvalidOutcome(reason) => EngineError::BadOutcome {
                    program: self.program_name(),
                    stderr,
                    reason,
                },
                other => other,
            })?;
        Ok(outcome)
    }
}
