//! In-memory status code counter.

use remedy_common::{ErrorCodeRecorder, StatusCode, TelemetryError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct CounterState {
    counts: BTreeMap<StatusCode, u64>,
    history: Vec<StatusCode>,
}

/// Thread-safe counter keeping totals per code and arrival order.
#[derive(Debug, Default)]
pub struct ErrorCodeCounter {
    state: Mutex<CounterState>,
}

impl ErrorCodeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, CounterState>, TelemetryError> {
        self.state
            .lock()
            .map_err(|_| TelemetryError::Unavailable("error code counter poisoned".to_string()))
    }

    /// Times `code` has been recorded.
    pub fn count(&self, code: StatusCode) -> u64 {
        self.lock()
            .map(|state| state.counts.get(&code).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.lock()
            .map(|state| state.history.len() as u64)
            .unwrap_or(0)
    }

    /// Codes in the order they were recorded.
    pub fn history(&self) -> Vec<StatusCode> {
        self.lock()
            .map(|state| state.history.clone())
            .unwrap_or_default()
    }

    /// Per-code totals in catalog order.
    pub fn snapshot(&self) -> Vec<(StatusCode, u64)> {
        self.lock()
            .map(|state| state.counts.iter().map(|(code, n)| (*code, *n)).collect())
            .unwrap_or_default()
    }
}

impl ErrorCodeRecorder for ErrorCodeCounter {
    fn record_error_code(&self, code: StatusCode) -> Result<(), TelemetryError> {
        let mut state = self.lock()?;
        *state.counts.entry(code).or_insert(0) += 1;
        state.history.push(code);
        Ok(())
    }
}
