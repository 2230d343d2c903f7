use thiserror::Error;

use crate::flow::FlowError;
use crate::report::ReportError;
use crate::scenario::types::ScenarioPhase;

#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Invalid or contradictory scenario parameters, detected before any
    /// flow is started.
    #[error("Invalid scenario configuration: {0}")]
    Configuration(String),

    /// API called outside its allowed state-machine window.
    #[error("Operation '{operation}' not allowed in phase {phase:?}")]
    InvalidState {
        operation: &'static str,
        phase: ScenarioPhase,
    },

    /// A flow failed to begin traffic generation. The whole run is
    /// aborted: started flows are stopped and partial results discarded.
    #[error("Flow '{flow}' failed to start")]
    FlowStart {
        flow: String,
        #[source]
        source: FlowError,
    },

    #[error("Report rendering failed: {0}")]
    Report(#[from] ReportError),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
