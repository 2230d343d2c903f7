use std::time::Duration;

/// Structured run-progress events emitted by the scenario.
///
/// The scenario takes an explicit sink at construction instead of relying
/// on ambient logging configuration; embedders can capture events for
/// their own progress display or pass [`NullDiagnostics`] to silence them.
#[derive(Debug, Clone, Copy)]
pub enum DiagnosticEvent<'a> {
    ScenarioStarted {
        flow_count: usize,
        deadline: Duration,
    },
    FlowStarted {
        flow: &'a str,
    },
    FlowStartFailed {
        flow: &'a str,
        reason: &'a str,
    },
    AllFlowsDone {
        elapsed: Duration,
    },
    DeadlineReached {
        deadline: Duration,
    },
    GracePeriod {
        duration: Duration,
    },
    AnalyserUnavailable {
        flow: &'a str,
        analyser: &'a str,
        reason: &'a str,
    },
    ScenarioFinalized {
        elapsed: Duration,
    },
    RunAborted {
        reason: &'a str,
    },
}

pub trait DiagnosticsSink: Send + Sync {
    fn event(&self, event: DiagnosticEvent<'_>);
}

/// Default sink: forwards events to `tracing`.
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn event(&self, event: DiagnosticEvent<'_>) {
        match event {
            DiagnosticEvent::ScenarioStarted {
                flow_count,
                deadline,
            } => {
                tracing::info!(flow_count, ?deadline, "scenario started");
            }
            DiagnosticEvent::FlowStarted { flow } => {
                tracing::info!(flow, "flow started");
            }
            DiagnosticEvent::FlowStartFailed { flow, reason } => {
                tracing::error!(flow, reason, "flow failed to start");
            }
            DiagnosticEvent::AllFlowsDone { elapsed } => {
                tracing::info!(?elapsed, "all flows completed");
            }
            DiagnosticEvent::DeadlineReached { deadline } => {
                tracing::info!(?deadline, "stop deadline reached");
            }
            DiagnosticEvent::GracePeriod { duration } => {
                tracing::info!(?duration, "waiting for in-flight traffic to settle");
            }
            DiagnosticEvent::AnalyserUnavailable {
                flow,
                analyser,
                reason,
            } => {
                tracing::warn!(flow, analyser, reason, "analyser result unavailable");
            }
            DiagnosticEvent::ScenarioFinalized { elapsed } => {
                tracing::info!(?elapsed, "scenario finalized");
            }
            DiagnosticEvent::RunAborted { reason } => {
                tracing::error!(reason, "scenario run aborted");
            }
        }
    }
}

/// Sink that drops every event.
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    fn event(&self, _event: DiagnosticEvent<'_>) {}
}
