//! Seam to the telemetry sink that aggregates status codes.

use crate::errors::StatusCode;
use thiserror::Error;

/// Errors a recorder may report. The engine logs and drops them.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode telemetry record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("telemetry sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives the resolved status code of each external classification.
pub trait ErrorCodeRecorder: Send + Sync {
    fn record_error_code(&self, code: StatusCode) -> Result<(), TelemetryError>;
}

/// Recorder that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl ErrorCodeRecorder for NoopRecorder {
    fn record_error_code(&self, _code: StatusCode) -> Result<(), TelemetryError> {
        Ok(())
    }
}

impl<R: ErrorCodeRecorder + ?Sized> ErrorCodeRecorder for std::sync::Arc<R> {
    fn record_error_code(&self, code: StatusCode) -> Result<(), TelemetryError> {
        (**self).record_error_code(code)
    }
}
