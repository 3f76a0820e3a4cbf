//! Append-only journey assignment log.
//!
//! One JSON line per journey captures the full flag-evaluation detail so
//! post-analysis can reconstruct experiment assignment without the sink data.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::flags::{EvaluationDetail, FlagValue};
use crate::Result;

/// What gets logged for one journey.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyAssignment<'a> {
    pub timestamp: DateTime<Utc>,
    pub user_key: &'a str,
    pub trial_days_detail: &'a EvaluationDetail,
    pub hero_banner_detail: &'a EvaluationDetail,
    pub seasonal_banner: &'a FlagValue,
}

/// Records one journey's flag assignments to storage.
pub trait AssignmentLogger {
    /// Logs the assignment. Failures are recoverable: the caller logs and
    /// continues with the journey.
    fn log_assignment(&mut self, assignment: &JourneyAssignment<'_>) -> Result<()>;
}

/// Logger that discards assignments.
#[derive(Debug, Default)]
pub struct NoopAssignmentLogger;

impl AssignmentLogger for NoopAssignmentLogger {
    fn log_assignment(&mut self, _assignment: &JourneyAssignment<'_>) -> Result<()> {
        Ok(())
    }
}

/// Line-delimited JSON logger.
///
/// Each line is serialized fully before a single write plus flush, keeping
/// the file append-safe under process interruption.
#[derive(Debug)]
pub struct JsonlAssignmentLog {
    file: File,
}

impl JsonlAssignmentLog {
    /// Opens (creating if needed) the log file in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<JsonlAssignmentLog> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JsonlAssignmentLog { file })
    }
}

impl AssignmentLogger for JsonlAssignmentLog {
    fn log_assignment(&mut self, assignment: &JourneyAssignment<'_>) -> Result<()> {
        let mut line = serde_json::to_string(assignment)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}
