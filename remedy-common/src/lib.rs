//! Shared classification engine for remedy.
//!
//! Turns raw pipeline failures into [`ActionableError`]s: a stable status
//! code plus ordered remediation suggestions derived from the current run.

pub mod actionable;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod global_config;
pub mod logging;
pub mod phase;
pub mod problem;
pub mod registry;
pub mod suggest;
pub mod telemetry;
pub mod testing;

pub use actionable::{ActionableError, Classified, as_classified, find_classified};
pub use context::{RunContext, RunContextHolder, RunOverrides};
pub use engine::{Classifier, OldImageManifest};
pub use errors::{StatusCode, Suggestion, SuggestionCode, concat_suggestions};
pub use global_config::{
    ContextConfig, FileConfigStore, GlobalConfigError, GlobalConfigStore,
};
pub use logging::{LogConfig, LoggingError, LoggingGuards, init_logging};
pub use phase::Phase;
pub use problem::{Problem, ProblemError};
pub use registry::{ProblemRegistry, RegistryError};
pub use suggest::SuggestionContext;
pub use telemetry::{ErrorCodeRecorder, NoopRecorder, TelemetryError};
