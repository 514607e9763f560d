//! Durable high-score ledger for the eagle simulation.
//!
//! Records are kept as one text line each, sorted by score descending, and
//! the whole set is rewritten on every save through a temp-file-then-rename
//! so a concurrent reader never observes a half-written store. A missing
//! store is an empty record set, not an error.

use chrono::NaiveDate;
use eaglesim_core::Eagle;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Ledger failure modes.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger rewrite failed: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("malformed ledger record: {line:?}")]
    MalformedRecord { line: String },
}

/// One finished session, as persisted to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub score: f64,
    pub date: NaiveDate,
    pub name: String,
    pub distance: f64,
    pub energy: f64,
}

impl ScoreRecord {
    /// Captures the eagle's state at session end.
    #[must_use]
    pub fn from_eagle(eagle: &Eagle, date: NaiveDate) -> Self {
        Self {
            score: eagle.score(),
            date,
            name: eagle.name().to_owned(),
            distance: eagle.total_distance(),
            energy: eagle.energy(),
        }
    }

    /// Renders the fixed line format:
    /// `score, YYYY-MM-DD, Eagle: name, Distance: d, Energy: e`.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{:.2}, {}, Eagle: {}, Distance: {:.2}, Energy: {:.2}",
            self.score,
            self.date.format("%Y-%m-%d"),
            self.name,
            self.distance,
            self.energy,
        )
    }

    /// Parses one store line. Names may themselves contain commas, so the
    /// trailing fields are split from the right.
    pub fn parse_line(line: &str) -> Result<Self, LedgerError> {
        let malformed = || LedgerError::MalformedRecord {
            line: line.to_owned(),
        };

        let mut head = line.splitn(3, ", ");
        let score = head
            .next()
            .and_then(|field| field.trim().parse::<f64>().ok())
            .ok_or_else(malformed)?;
        let date = head
            .next()
            .and_then(|field| NaiveDate::parse_from_str(field.trim(), "%Y-%m-%d").ok())
            .ok_or_else(malformed)?;
        let rest = head.next().ok_or_else(malformed)?;

        let rest = rest.strip_prefix("Eagle: ").ok_or_else(malformed)?;
        let (rest, energy_field) = rest.rsplit_once(", Energy: ").ok_or_else(malformed)?;
        let (name, distance_field) = rest.rsplit_once(", Distance: ").ok_or_else(malformed)?;
        let distance = distance_field.trim().parse::<f64>().map_err(|_| malformed())?;
        let energy = energy_field.trim().parse::<f64>().map_err(|_| malformed())?;

        Ok(Self {
            score,
            date,
            name: name.to_owned(),
            distance,
            energy,
        })
    }
}

/// Backing store for the record set. Implementations replace the whole set
/// on write; the ledger owns sorting.
pub trait ScoreStore: Send {
    /// Loads every record; an absent store yields an empty set.
    fn load(&self) -> Result<Vec<ScoreRecord>, LedgerError>;
    /// Atomically replaces the full record set.
    fn replace(&mut self, records: &[ScoreRecord]) -> Result<(), LedgerError>;
}

/// Text-file store, one record per line.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileStore {
    fn load(&self) -> Result<Vec<ScoreRecord>, LedgerError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(ScoreRecord::parse_line)
            .collect()
    }

    fn replace(&mut self, records: &[ScoreRecord]) -> Result<(), LedgerError> {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new_in(".")?,
        };
        for record in records {
            writeln!(tmp, "{}", record.to_line())?;
        }
        tmp.flush()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

/// In-memory store for tests and non-durable sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<ScoreRecord>,
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> Result<Vec<ScoreRecord>, LedgerError> {
        Ok(self.records.clone())
    }

    fn replace(&mut self, records: &[ScoreRecord]) -> Result<(), LedgerError> {
        self.records = records.to_vec();
        Ok(())
    }
}

/// The durable, score-sorted history of past sessions.
///
/// `save` is read-modify-write: load everything, append, stable-sort by
/// score descending, rewrite. Saving twice appends twice; the ledger never
/// deduplicates.
pub struct ScoreLedger {
    store: Box<dyn ScoreStore>,
}

impl ScoreLedger {
    #[must_use]
    pub fn with_store(store: Box<dyn ScoreStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_store(Box::new(FileStore::new(path)))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_store(Box::new(MemoryStore::default()))
    }

    /// Appends one record and rewrites the sorted set, returning the
    /// record's rank (0 is the best score).
    pub fn save(&mut self, record: ScoreRecord) -> Result<usize, LedgerError> {
        let mut records = self.store.load()?;
        records.push(record.clone());
        // Stable sort: ties keep their prior order.
        records.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.store.replace(&records)?;
        // The new copy sorts after any identical prior record, so it is the
        // rightmost match.
        let rank = records
            .iter()
            .rposition(|r| *r == record)
            .unwrap_or(records.len() - 1);
        Ok(rank)
    }

    /// Loads the full record set, best score first.
    pub fn records(&self) -> Result<Vec<ScoreRecord>, LedgerError> {
        self.store.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn record(score: f64, name: &str) -> ScoreRecord {
        ScoreRecord {
            score,
            date: date("2026-08-27"),
            name: name.to_owned(),
            distance: score,
            energy: 12.75,
        }
    }

    #[test]
    fn line_format_matches_the_store_contract() {
        let line = record(128.5, "Skye").to_line();
        assert_eq!(
            line,
            "128.50, 2026-08-27, Eagle: Skye, Distance: 128.50, Energy: 12.75"
        );
    }

    #[test]
    fn parse_inverts_format() {
        let original = record(74.25, "Storm");
        let parsed = ScoreRecord::parse_line(&original.to_line()).expect("round-trip");
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_tolerates_commas_in_names() {
        let original = record(10.0, "Fast, Feathered");
        let parsed = ScoreRecord::parse_line(&original.to_line()).expect("comma name");
        assert_eq!(parsed.name, "Fast, Feathered");
    }

    #[test]
    fn parse_rejects_garbage() {
        for line in [
            "",
            "not a score, 2026-08-27, Eagle: X, Distance: 1.00, Energy: 1.00",
            "1.00, nonsense-date, Eagle: X, Distance: 1.00, Energy: 1.00",
            "1.00, 2026-08-27, missing prefix",
        ] {
            assert!(
                matches!(
                    ScoreRecord::parse_line(line),
                    Err(LedgerError::MalformedRecord { .. })
                ),
                "line should be rejected: {line:?}"
            );
        }
    }

    #[test]
    fn save_keeps_records_sorted_descending() {
        let mut ledger = ScoreLedger::in_memory();
        for (score, name) in [(10.0, "a"), (40.0, "b"), (25.0, "c"), (40.0, "d")] {
            ledger.save(record(score, name)).expect("save");
        }
        let records = ledger.records().expect("load");
        assert_eq!(records.len(), 4);
        for pair in records.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // Stable: the earlier 40.0 stays ahead of the later one.
        assert_eq!(records[0].name, "b");
        assert_eq!(records[1].name, "d");
    }

    #[test]
    fn save_reports_rank() {
        let mut ledger = ScoreLedger::in_memory();
        assert_eq!(ledger.save(record(10.0, "a")).expect("save"), 0);
        assert_eq!(ledger.save(record(40.0, "b")).expect("save"), 0);
        assert_eq!(ledger.save(record(25.0, "c")).expect("save"), 1);
    }

    #[test]
    fn saving_twice_appends_twice() {
        let mut ledger = ScoreLedger::in_memory();
        let r = record(5.0, "dup");
        assert_eq!(ledger.save(r.clone()).expect("first save"), 0);
        // The rank belongs to the new copy, which sits behind the old one.
        assert_eq!(ledger.save(r).expect("second save"), 1);
        assert_eq!(ledger.records().expect("load").len(), 2);
    }
}
