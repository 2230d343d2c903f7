use serde::Serialize;
use std::time::Duration;

use crate::analysis::AnalyserReport;

/// Flow lifecycle. `Finalized` is entered only by the scenario during
/// result collection; no further traffic or samples are accepted there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowState {
    Created,
    Running,
    NaturallyCompleted,
    Stopped,
    Finalized,
}

impl FlowState {
    /// True once the flow's own completion policy has been satisfied or it
    /// has been explicitly stopped.
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            FlowState::NaturallyCompleted | FlowState::Stopped | FlowState::Finalized
        )
    }
}

/// When a flow naturally finishes, independent of the scenario's overall
/// stop signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompletionPolicy {
    FixedDuration(Duration),
    FixedCount(u64),
    Unbounded,
}

/// How the flow ended, as recorded in the scenario snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowCompletion {
    /// The flow's own policy was satisfied before the scenario stop.
    NaturallyCompleted,
    /// The scenario's stop signal ended the flow.
    StoppedByDeadline,
}

/// Emission parameters derived from a validated flow configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EmissionSchedule {
    /// Time between consecutive unit emissions.
    pub interval: Duration,
    /// Payload size per unit.
    pub unit_bytes: u64,
    /// Total units to emit, `None` for duration-bound or unbounded flows.
    pub count: Option<u64>,
    /// Emission window, `None` for count-bound or unbounded flows.
    pub duration: Option<Duration>,
    /// Whether units embed a send timestamp for latency measurement.
    pub latency_tag: bool,
}

impl EmissionSchedule {
    pub fn policy(&self) -> CompletionPolicy {
        match (self.count, self.duration) {
            (Some(count), _) => CompletionPolicy::FixedCount(count),
            (None, Some(duration)) => CompletionPolicy::FixedDuration(duration),
            (None, None) => CompletionPolicy::Unbounded,
        }
    }
}

/// Per-flow entry of the finalized scenario snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub name: String,
    pub kind: &'static str,
    pub source: String,
    pub destination: String,
    pub completion: FlowCompletion,
    pub units_sent: u64,
    pub bytes_sent: u64,
    pub analysers: Vec<AnalyserReport>,
}
