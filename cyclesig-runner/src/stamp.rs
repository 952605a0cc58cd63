//! Refresh stamp — gates how often the market scanner re-ranks the universe.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};

const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A file holding the time of the last refresh.
#[derive(Debug, Clone)]
pub struct RefreshStamp {
    path: PathBuf,
    interval: Duration,
}

impl RefreshStamp {
    /// Thirty-minute stamp at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_interval(path, Duration::minutes(30))
    }

    pub fn with_interval(path: PathBuf, interval: Duration) -> Self {
        Self { path, interval }
    }

    /// Time of the last refresh, if the stamp exists and parses.
    pub fn last(&self) -> Option<NaiveDateTime> {
        let content = fs::read_to_string(&self.path).ok()?;
        NaiveDateTime::parse_from_str(content.trim(), STAMP_FORMAT).ok()
    }

    /// A refresh is due when the stamp is missing, unreadable, or older than
    /// the interval.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        match self.last() {
            Some(last) => now - last > self.interval,
            None => true,
        }
    }

    /// Record a refresh at `now`.
    pub fn touch(&self, now: NaiveDateTime) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, now.format(STAMP_FORMAT).to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
