use thiserror::Error;

use crate::flow::types::FlowState;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Invalid flow configuration: {0}")]
    Config(String),

    #[error("Operation '{operation}' not allowed in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: FlowState,
    },

    #[error("Flow failed to start: endpoint '{endpoint}' unavailable")]
    StartFailed { endpoint: String },
}

pub type FlowResult<T> = Result<T, FlowError>;
