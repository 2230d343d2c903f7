//! Scenario orchestration module.
//!
//! A scenario owns an ordered set of flows and report sinks, computes the
//! run's effective stop deadline across heterogeneous completion policies,
//! fans out one worker per flow, and fans back in at the
//! stop -> grace -> finalize barrier before reporting.

mod diagnostics;
pub mod error;
mod scenario;
pub mod types;

pub use diagnostics::{DiagnosticEvent, DiagnosticsSink, NullDiagnostics, TracingDiagnostics};
pub use error::{ScenarioError, ScenarioResult};
pub use scenario::Scenario;
pub use types::{ScenarioConfig, ScenarioPhase, ScenarioSnapshot};
