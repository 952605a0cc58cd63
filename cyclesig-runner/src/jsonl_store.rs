//! JSONL signal store — one JSON object per line.
//!
//! Inserts append a line; status changes rewrite the whole file through a
//! temporary sibling and an atomic rename. Every operation holds an advisory
//! lock on `<path>.lock`: shared for reads, exclusive for read-then-write
//! sequences. The lock is per open file, so separate processes and separate
//! store instances in one process exclude each other alike.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use fd_lock::RwLock;

use cyclesig_core::domain::{Direction, Signal, SignalId, SignalStatus};
use cyclesig_core::store::{
    apply_transition, matches_recent, newest_first, InsertOutcome, SignalStore, StoreError,
};

pub struct JsonlSignalStore {
    path: PathBuf,
}

impl JsonlSignalStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path to the signals file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path to the lock file guarding the signals file.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock_file(&self) -> Result<RwLock<File>, StoreError> {
        let path = self.lock_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        Ok(RwLock::new(file))
    }

    /// Read every stored signal. A malformed line is an error, not skipped.
    pub fn read_all(&self) -> Result<Vec<Signal>, StoreError> {
        let lock = self.lock_file()?;
        let _shared = lock.read()?;
        self.load()
    }

    /// Caller holds the lock.
    fn load(&self) -> Result<Vec<Signal>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut signals = Vec::new();
        for (i, line) in io::BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let signal = serde_json::from_str::<Signal>(&line).map_err(|e| StoreError::Corrupt {
                line: i + 1,
                reason: e.to_string(),
            })?;
            signals.push(signal);
        }
        Ok(signals)
    }

    fn append(&self, signal: &Signal) -> Result<(), StoreError> {
        let json = serde_json::to_string(signal)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    fn rewrite(&self, signals: &[Signal]) -> Result<(), StoreError> {
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        {
            let mut file = fs::File::create(&tmp)?;
            for signal in signals {
                let json = serde_json::to_string(signal)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                writeln!(file, "{json}")?;
            }
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SignalStore for JsonlSignalStore {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn find_recent_signal(
        &self,
        instrument: &str,
        direction: Direction,
        statuses: &[SignalStatus],
        since: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        let lock = self.lock_file()?;
        let _shared = lock.read()?;
        Ok(self
            .load()?
            .iter()
            .any(|s| matches_recent(s, instrument, direction, statuses, since)))
    }

    fn insert_signal(&self, signal: &Signal) -> Result<InsertOutcome, StoreError> {
        let mut lock = self.lock_file()?;
        let _exclusive = lock.write()?;
        if self.load()?.iter().any(|s| s.id == signal.id) {
            return Ok(InsertOutcome::Duplicate);
        }
        self.append(signal)?;
        Ok(InsertOutcome::Inserted)
    }

    fn update_status(&self, id: &SignalId, status: SignalStatus) -> Result<(), StoreError> {
        let mut lock = self.lock_file()?;
        let _exclusive = lock.write()?;
        let mut signals = self.load()?;
        let signal = signals
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if signal.status == status {
            return Ok(());
        }
        apply_transition(signal, status)?;
        self.rewrite(&signals)
    }

    fn recent(&self, limit: usize) -> Result<Vec<Signal>, StoreError> {
        let lock = self.lock_file()?;
        let _shared = lock.read()?;
        Ok(newest_first(self.load()?, limit))
    }
}
