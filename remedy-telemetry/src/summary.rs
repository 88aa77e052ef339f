//! Aggregation over telemetry logs.

use crate::jsonl::{ErrorCodeRecord, read_records};
use chrono::{DateTime, Utc};
use remedy_common::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("failed to read telemetry log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Occurrences of one status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeCount {
    pub code: StatusCode,
    /// Display form, e.g. `RMD-E201`.
    pub code_string: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// Most frequent first; ties in catalog order.
    pub codes: Vec<CodeCount>,
}

impl Summary {
    /// Table for terminals.
    pub fn to_pretty(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} recorded error(s)", self.total);
        if let (Some(first), Some(last)) = (self.first_seen, self.last_seen) {
            let _ = writeln!(out, "from {} to {}", first.to_rfc3339(), last.to_rfc3339());
        }
        for entry in &self.codes {
            let _ = writeln!(
                out,
                "  {:<9} {:>6}  {}",
                entry.code_string,
                entry.count,
                entry.code.message()
            );
        }
        out
    }
}

/// Summarizes the telemetry log at `path`.
pub fn summarize_log(path: &Path) -> Result<Summary, SummaryError> {
    let records = read_records(path)?;
    Ok(summarize_records(&records))
}

pub fn summarize_records(records: &[ErrorCodeRecord]) -> Summary {
    let mut counts: BTreeMap<StatusCode, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(record.code).or_insert(0) += 1;
    }

    let mut codes: Vec<CodeCount> = counts
        .into_iter()
        .map(|(code, count)| CodeCount {
            code,
            code_string: code.code_string(),
            count,
        })
        .collect();
    // Stable sort keeps catalog order among equal counts.
    codes.sort_by(|a, b| b.count.cmp(&a.count));

    Summary {
        total: records.len() as u64,
        first_seen: records.iter().map(|r| r.timestamp).min(),
        last_seen: records.iter().map(|r| r.timestamp).max(),
        codes,
    }
}
