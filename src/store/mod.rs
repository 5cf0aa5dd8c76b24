pub mod csv;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::Result;
use crate::domain::ReviewRecord;
use crate::harvest::{lock_state, SharedState};

pub use self::csv::CsvSink;

/// Durable destination for accepted reviews
pub trait ReviewSink: Send + Sync {
    /// Write the full record set, replacing any previous write.
    fn write(&self, records: &[ReviewRecord]) -> Result<PathBuf>;

    fn location(&self) -> &Path;
}

/// What a flush did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    Written { path: PathBuf, records: usize },
    NothingToPersist,
}

impl fmt::Display for FlushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushOutcome::Written { path, records } => {
                write!(f, "Saved {} reviews to {}", records, path.display())
            }
            FlushOutcome::NothingToPersist => f.write_str("No reviews collected, nothing saved"),
        }
    }
}

/// Snapshots the accepted records of a harvest and hands them to a sink.
///
/// Safe to call while a harvest is still holding the shared state: the
/// state lock is held only while copying the records, and concurrent
/// flushes are serialized so the last one wins.
pub struct Persistence {
    sink: Box<dyn ReviewSink>,
    writing: Mutex<()>,
}

impl Persistence {
    pub fn new(sink: impl ReviewSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            writing: Mutex::new(()),
        }
    }

    pub fn flush(&self, state: &SharedState) -> Result<FlushOutcome> {
        let _writing = self.writing.lock().unwrap_or_else(PoisonError::into_inner);
        let records = lock_state(state).accepted().to_vec();

        if records.is_empty() {
            info!("Nothing to persist");
            return Ok(FlushOutcome::NothingToPersist);
        }

        let path = self.sink.write(&records)?;
        info!("Persisted {} reviews to {}", records.len(), path.display());
        Ok(FlushOutcome::Written {
            path,
            records: records.len(),
        })
    }

    pub fn location(&self) -> &Path {
        self.sink.location()
    }
}

/// Where and how results are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file (default: reviews_<timestamp>.csv in the working directory)
    pub path: Option<PathBuf>,

    /// Prefix the file with a UTF-8 byte-order mark for spreadsheet apps (default: true)
    pub bom: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            bom: true,
        }
    }
}

impl OutputConfig {
    /// Configured path, or a timestamped default name
    pub fn resolve_path(&self, now: DateTime<Local>) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("reviews_{}.csv", now.format("%Y%m%d_%H%M%S"))))
    }
}
