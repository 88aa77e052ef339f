//! Telemetry sinks for classified status codes.
//!
//! - [`ErrorCodeCounter`]: in-memory counts for a single process
//! - [`JsonlRecorder`]: append-only JSONL log, one record per code
//! - [`summarize_log`]: per-code totals over such a log
#![forbid(unsafe_code)]

pub mod counter;
pub mod jsonl;
pub mod summary;

pub use counter::ErrorCodeCounter;
pub use jsonl::{ErrorCodeRecord, JsonlRecorder, read_records};
pub use remedy_common::{LogConfig, init_logging};
pub use summary::{CodeCount, Summary, SummaryError, summarize_log, summarize_records};
