//! Test support shared by the remedy crates.
//!
//! Integration tests install the JSONL subscriber once per binary:
//!
//! ```ignore
//! #[ctor::ctor]
//! fn setup() {
//!     remedy_common::testing::init_global_test_logging();
//! }
//! ```

mod log;

pub use log::{CaseLogger, TestLogEntry, TestPhase, init_global_test_logging};
