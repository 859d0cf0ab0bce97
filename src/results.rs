//! Append-only CSV log of checked seeds.
//!
//! The file starts with a header naming every player:
//!
//! ```text
//! seed,number,self_interaction,Tit For Tat,"First by Tideman and Chieruzzi: (D, D)",...
//! ```
//!
//! and every checked seed adds one row per [`RankVariant`]:
//!
//! ```text
//! 0,3,True,1,4,2,...
//! 0,5,False,1,2,5,...
//! ```
//!
//! `number` is how many players landed on their reported rank. Fields that
//! contain a comma, quote or line break are quoted, with quotes doubled.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::ranks::RankVariant;
use crate::roster::Roster;

const FIXED_COLUMNS: [&str; 3] = ["seed", "number", "self_interaction"];

#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error on results file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error on results file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Results file {} has no header row", .0.display())]
    MissingHeader(PathBuf),

    #[error("Results file header does not match the roster: expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Malformed results row {row}: {reason}")]
    Malformed { row: usize, reason: String },

    #[error("Record has {found} ranks but the results file has {expected} players")]
    WrongWidth { expected: usize, found: usize },

    #[error("Results file already holds seed {0}, there is no next seed")]
    SeedSpaceExhausted(u64),
}

/// One row of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRecord {
    pub seed: u64,
    /// Number of players on their reported rank
    pub number: usize,
    pub variant: RankVariant,
    /// Reproduced rank per player, in roster order
    pub ranks: Vec<usize>,
}

impl SeedRecord {
    fn to_fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(FIXED_COLUMNS.len() + self.ranks.len());
        fields.push(self.seed.to_string());
        fields.push(self.number.to_string());
        fields.push(self.variant.as_csv().to_string());
        fields.extend(self.ranks.iter().map(|r| r.to_string()));
        fields
    }

    fn from_fields(
        row: usize,
        fields: &csv::StringRecord,
        num_players: usize,
    ) -> Result<Self, LogError> {
        let malformed = |reason: String| LogError::Malformed { row, reason };

        if fields.len() != FIXED_COLUMNS.len() + num_players {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                FIXED_COLUMNS.len() + num_players,
                fields.len()
            )));
        }

        let seed = fields[0]
            .trim()
            .parse()
            .map_err(|e| malformed(format!("bad seed {:?}: {e}", &fields[0])))?;
        let number = fields[1]
            .trim()
            .parse()
            .map_err(|e| malformed(format!("bad number {:?}: {e}", &fields[1])))?;
        let variant = RankVariant::from_csv(&fields[2])
            .ok_or_else(|| malformed(format!("bad self_interaction {:?}", &fields[2])))?;
        let ranks = fields
            .iter()
            .skip(FIXED_COLUMNS.len())
            .map(|f| {
                f.trim()
                    .parse()
                    .map_err(|e| malformed(format!("bad rank {f:?}: {e}")))
            })
            .collect::<Result<Vec<usize>, _>>()?;

        Ok(Self {
            seed,
            number,
            variant,
            ranks,
        })
    }
}

/// Handle on a results file whose header matches a roster.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
    num_players: usize,
    next_seed: u64,
}

impl ResultsLog {
    /// Open `path`, or create it with a header for `roster`.
    ///
    /// A fresh file starts at `start_seed`. An existing file resumes one past
    /// the highest seed it holds, or at `start_seed` if it holds no rows.
    #[instrument(level = "debug", skip(path, roster), fields(path = %path.as_ref().display()))]
    pub fn open_or_create<P: AsRef<Path>>(
        path: P,
        roster: &Roster,
        start_seed: u64,
    ) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let header: Vec<String> = FIXED_COLUMNS
                .iter()
                .copied()
                .chain(roster.names())
                .map(str::to_string)
                .collect();
            let bytes = encode_rows([header])?;
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)?
                .write_all(&bytes)?;
            info!(path = %path.display(), start_seed, "Created results file");
            return Ok(Self {
                path,
                num_players: roster.len(),
                next_seed: start_seed,
            });
        }

        let (names, records) = read_records(&path)?;
        let expected: Vec<String> = roster.names().map(str::to_string).collect();
        if names != expected {
            return Err(LogError::HeaderMismatch {
                expected,
                found: names,
            });
        }

        let next_seed = match records.iter().map(|r| r.seed).max() {
            Some(max) => max
                .checked_add(1)
                .ok_or(LogError::SeedSpaceExhausted(max))?,
            None => start_seed,
        };
        info!(
            path = %path.display(),
            rows = records.len(),
            next_seed,
            "Resuming from existing results file"
        );

        Ok(Self {
            path,
            num_players: roster.len(),
            next_seed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First seed not yet present in the file.
    pub fn next_seed(&self) -> u64 {
        self.next_seed
    }

    /// Append a single row.
    pub fn append(&mut self, record: &SeedRecord) -> Result<(), LogError> {
        self.append_all(std::slice::from_ref(record))
    }

    /// Append several rows with a single write.
    ///
    /// Every record is checked before anything is written, so either all rows
    /// land in the file or none do.
    pub fn append_all(&mut self, records: &[SeedRecord]) -> Result<(), LogError> {
        if let Some(bad) = records.iter().find(|r| r.ranks.len() != self.num_players) {
            return Err(LogError::WrongWidth {
                expected: self.num_players,
                found: bad.ranks.len(),
            });
        }
        if records.is_empty() {
            return Ok(());
        }

        let bytes = encode_rows(records.iter().map(SeedRecord::to_fields))?;
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(&bytes)?;

        for record in records {
            debug!(
                seed = record.seed,
                number = record.number,
                variant = %record.variant,
                "Appended result row"
            );
            self.next_seed = self.next_seed.max(record.seed.saturating_add(1));
        }
        Ok(())
    }

    pub fn records(&self) -> Result<Vec<SeedRecord>, LogError> {
        read_records(&self.path).map(|(_, records)| records)
    }
}

/// Read player names from the header and every row of a results file.
///
/// Accepts both `\n` and `\r\n` line endings.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, Vec<SeedRecord>), LogError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Err(LogError::MissingHeader(path.to_path_buf()));
    }
    if header.len() < FIXED_COLUMNS.len()
        || header
            .iter()
            .take(FIXED_COLUMNS.len())
            .map(str::trim)
            .ne(FIXED_COLUMNS.iter().copied())
    {
        return Err(LogError::Malformed {
            row: 1,
            reason: format!("header must start with {}", FIXED_COLUMNS.join(",")),
        });
    }
    let names: Vec<String> = header
        .iter()
        .skip(FIXED_COLUMNS.len())
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let line = row
            .position()
            .map_or(idx + 2, |pos| pos.line() as usize);
        records.push(SeedRecord::from_fields(line, &row, names.len())?);
    }

    Ok((names, records))
}

/// Encode rows as CSV text, quoting fields only where needed.
fn encode_rows<I>(rows: I) -> Result<Vec<u8>, LogError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|e| LogError::Io(e.into_error()))
}
