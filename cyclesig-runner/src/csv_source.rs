//! CSV bar source — one file per symbol and timeframe.
//!
//! Layout: `<dir>/<SYMBOL>_<TIMEFRAME>.csv` with header
//! `time,open,high,low,close,tick_volume,real_volume`. `real_volume` may be
//! omitted. Timestamps are naive broker-server time, either ISO
//! (`2024-06-04T10:05:00`) or space-separated (`2024-06-04 10:05:00`).
//! A missing file means the instrument has no data, not an error.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;

use cyclesig_core::data::{keep_last, BarSource, DataError};
use cyclesig_core::domain::{Bar, Timeframe};

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    tick_volume: f64,
    #[serde(default)]
    real_volume: f64,
}

fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
}

#[derive(Debug, Clone)]
pub struct CsvBarSource {
    dir: PathBuf,
}

impl CsvBarSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding `symbol` bars on `timeframe`.
    pub fn file_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{symbol}_{timeframe}.csv"))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<Bar>, DataError> {
        let display = path.display().to_string();
        let mut reader = match csv::Reader::from_path(path) {
            Ok(reader) => reader,
            Err(e) => {
                return match e.into_kind() {
                    csv::ErrorKind::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                        Ok(Vec::new())
                    }
                    csv::ErrorKind::Io(source) => Err(DataError::Io {
                        path: display,
                        source,
                    }),
                    other => Err(DataError::Malformed {
                        path: display,
                        reason: format!("{other:?}"),
                    }),
                };
            }
        };

        let mut bars = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| DataError::Malformed {
                path: display.clone(),
                reason: e.to_string(),
            })?;
            let time = parse_time(&row.time).ok_or_else(|| DataError::Malformed {
                path: display.clone(),
                reason: format!("row {}: unrecognised timestamp '{}'", i + 1, row.time),
            })?;
            bars.push(Bar {
                time,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                tick_volume: row.tick_volume,
                real_volume: row.real_volume,
            });
        }
        Ok(bars)
    }
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self.read_file(&self.file_path(symbol, timeframe))?;
        Ok(keep_last(bars, count))
    }
}
