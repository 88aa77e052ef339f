//! Append-only JSONL telemetry log.
//!
//! Each recorded code becomes one line:
//! `{"timestamp":"2026-01-01T00:00:00Z","code":"BUILD_CANCELLED","code_number":203}`.

use chrono::{DateTime, Utc};
use remedy_common::{ErrorCodeRecorder, StatusCode, TelemetryError};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::summary::SummaryError;

/// One line of the telemetry log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCodeRecord {
    pub timestamp: DateTime<Utc>,
    pub code: StatusCode,
    pub code_number: u16,
}

impl ErrorCodeRecord {
    pub fn now(code: StatusCode) -> Self {
        Self {
            timestamp: Utc::now(),
            code,
            code_number: code.code_number(),
        }
    }
}

/// Recorder appending [`ErrorCodeRecord`]s to a file.
#[derive(Debug)]
pub struct JsonlRecorder {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlRecorder {
    /// Opens `path` for appending, creating it and its parent directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TelemetryError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "opened telemetry log");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorCodeRecorder for JsonlRecorder {
    fn record_error_code(&self, code: StatusCode) -> Result<(), TelemetryError> {
        let mut line = serde_json::to_string(&ErrorCodeRecord::now(code))?;
        line.push('\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| TelemetryError::Unavailable("telemetry log writer poisoned".to_string()))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Reads every record from a telemetry log. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<ErrorCodeRecord>, SummaryError> {
    let file = File::open(path).map_err(|source| SummaryError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| SummaryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| SummaryError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}
