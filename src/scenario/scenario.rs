use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::analysis::AnalyserOutcome;
use crate::flow::Flow;
use crate::report::ReportSink;
use crate::scenario::diagnostics::{DiagnosticEvent, DiagnosticsSink, TracingDiagnostics};
use crate::scenario::error::{ScenarioError, ScenarioResult};
use crate::scenario::types::{ScenarioConfig, ScenarioPhase, ScenarioSnapshot};

/// Slack added on top of a deadline derived from flow estimates, so a
/// flow finishing exactly on its estimate is recorded as naturally
/// completed rather than stopped. Explicit durations get no slack.
const DERIVED_DEADLINE_MARGIN: Duration = Duration::from_millis(250);

/// Orchestrator for one traffic-test run.
///
/// Flows start in insertion order without awaiting each other's setup, run
/// concurrently until every flow is done or the effective stop deadline
/// elapses, then pass the stop -> grace -> finalize barrier before any
/// analyser computes loss. A scenario runs at most once.
pub struct Scenario {
    config: ScenarioConfig,
    diagnostics: Arc<dyn DiagnosticsSink>,
    flows: Vec<Flow>,
    sinks: Vec<Box<dyn ReportSink>>,
    phase: ScenarioPhase,
    snapshot: Option<ScenarioSnapshot>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::with_diagnostics(Arc::new(TracingDiagnostics))
    }

    /// Build a scenario with an explicit diagnostics sink; the engine
    /// itself requires no ambient logging configuration.
    pub fn with_diagnostics(diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            config: ScenarioConfig::default(),
            diagnostics,
            flows: Vec::new(),
            sinks: Vec::new(),
            phase: ScenarioPhase::Idle,
            snapshot: None,
        }
    }

    pub fn with_config(mut self, config: ScenarioConfig) -> Self {
        self.config = config;
        self
    }

    pub fn phase(&self) -> ScenarioPhase {
        self.phase
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// The finalized run view, available once `run` completed.
    pub fn snapshot(&self) -> Option<&ScenarioSnapshot> {
        self.snapshot.as_ref()
    }

    /// Register a flow. Insertion order is start order.
    pub fn add_flow(&mut self, flow: Flow) -> ScenarioResult<()> {
        self.check_idle("add_flow")?;
        self.flows.push(flow);
        Ok(())
    }

    /// Register a report sink, invoked once per `report` call.
    pub fn add_report(&mut self, sink: Box<dyn ReportSink>) -> ScenarioResult<()> {
        self.check_idle("add_report")?;
        self.sinks.push(sink);
        Ok(())
    }

    fn check_idle(&self, operation: &'static str) -> ScenarioResult<()> {
        if self.phase != ScenarioPhase::Idle {
            return Err(ScenarioError::InvalidState {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Effective stop deadline: an explicit overall duration wins;
    /// otherwise the latest natural completion estimate across flows.
    /// Unbounded flows contribute nothing, so a scenario of only unbounded
    /// flows needs an explicit duration.
    fn effective_deadline(&self, overall: Option<Duration>) -> ScenarioResult<Duration> {
        if let Some(duration) = overall {
            if duration.is_zero() {
                return Err(ScenarioError::Configuration(
                    "overall duration must be non-zero".into(),
                ));
            }
            return Ok(duration);
        }

        self.flows
            .iter()
            .filter_map(|f| f.expected_duration())
            .max()
            .map(|longest| longest + DERIVED_DEADLINE_MARGIN)
            .ok_or_else(|| {
                ScenarioError::Configuration(
                    "no overall duration given and no flow has a bounded completion policy"
                        .into(),
                )
            })
    }

    /// Run the scenario: start all flows, wait for the stop condition,
    /// stop, settle, finalize. Blocks the calling task until finalization
    /// is complete; this is the only long-blocking call in the API.
    pub async fn run(&mut self, overall_duration: Option<Duration>) -> ScenarioResult<()> {
        if self.phase != ScenarioPhase::Idle {
            return Err(ScenarioError::InvalidState {
                operation: "run",
                phase: self.phase,
            });
        }
        if self.flows.is_empty() {
            return Err(ScenarioError::Configuration(
                "scenario has no flows".into(),
            ));
        }
        // Resolved before any flow starts; a configuration error leaves
        // the scenario untouched.
        let deadline = self.effective_deadline(overall_duration)?;

        self.phase = ScenarioPhase::Running;
        let started_at = chrono::Utc::now();
        let start_instant = Instant::now();

        // Start phase: issue all starts back to back so flows begin
        // emitting within a bounded skew window. Any failure aborts the
        // whole run atomically.
        for index in 0..self.flows.len() {
            if let Err(error) = self.flows[index].start() {
                let failed = self.flows[index].name().to_string();
                self.diagnostics.event(DiagnosticEvent::FlowStartFailed {
                    flow: &failed,
                    reason: &error.to_string(),
                });
                self.abort_started(index).await;
                return Err(ScenarioError::FlowStart {
                    flow: failed,
                    source: error,
                });
            }
            self.diagnostics.event(DiagnosticEvent::FlowStarted {
                flow: self.flows[index].name(),
            });
        }
        self.diagnostics.event(DiagnosticEvent::ScenarioStarted {
            flow_count: self.flows.len(),
            deadline,
        });

        // Wait phase: whichever comes first of "every flow done" and the
        // effective deadline triggers the stop.
        let stop_at = start_instant + deadline;
        loop {
            if self.flows.iter().all(|f| f.is_done()) {
                self.diagnostics.event(DiagnosticEvent::AllFlowsDone {
                    elapsed: start_instant.elapsed(),
                });
                break;
            }
            let now = Instant::now();
            if now >= stop_at {
                self.diagnostics
                    .event(DiagnosticEvent::DeadlineReached { deadline });
                break;
            }
            tokio::time::sleep(self.config.poll_interval.min(stop_at - now)).await;
        }
        let traffic_elapsed = start_instant.elapsed();

        // Stop phase: idempotent for flows that already completed.
        for flow in &self.flows {
            flow.stop();
        }
        self.diagnostics.event(DiagnosticEvent::GracePeriod {
            duration: self.config.grace_period,
        });
        tokio::time::sleep(self.config.grace_period).await;

        // Finalize phase: every analyser's finalize runs behind the
        // barrier; failures are isolated per analyser.
        let mut flow_reports = Vec::with_capacity(self.flows.len());
        for flow in &self.flows {
            let report = flow.finalize().await;
            for analyser in &report.analysers {
                if let AnalyserOutcome::Unavailable { reason } = &analyser.outcome {
                    self.diagnostics.event(DiagnosticEvent::AnalyserUnavailable {
                        flow: &report.name,
                        analyser: &analyser.label,
                        reason,
                    });
                }
            }
            flow_reports.push(report);
        }

        let total_elapsed = start_instant.elapsed();
        self.snapshot = Some(ScenarioSnapshot {
            started_at,
            stopped_at: chrono::Utc::now(),
            effective_deadline: deadline,
            traffic_elapsed,
            total_elapsed,
            flows: flow_reports,
        });
        self.phase = ScenarioPhase::Finalized;
        self.diagnostics.event(DiagnosticEvent::ScenarioFinalized {
            elapsed: total_elapsed,
        });

        Ok(())
    }

    /// Stop the flows started before index `failed`, honor the grace
    /// period, then finalize them so no worker task or half-settled
    /// analyser state outlives the abort. Their results are discarded.
    async fn abort_started(&mut self, failed: usize) {
        for flow in &self.flows[..failed] {
            flow.stop();
        }
        if failed > 0 {
            tokio::time::sleep(self.config.grace_period).await;
        }
        for flow in &self.flows[..failed] {
            let _ = flow.finalize().await;
        }
        self.phase = ScenarioPhase::Aborted;
        self.diagnostics.event(DiagnosticEvent::RunAborted {
            reason: "flow start failure",
        });
    }

    /// Cleanup path for caller-initiated aborts (e.g. a process
    /// interrupt): runs the full stop -> grace -> finalize sequence on the
    /// flows so no test traffic or worker task leaks. No results are kept.
    pub async fn abort(&mut self) {
        if self.phase != ScenarioPhase::Running && self.phase != ScenarioPhase::Idle {
            return;
        }
        let any_started = self.flows.iter().any(|f| f.is_done() || f.units_sent() > 0);
        for flow in &self.flows {
            flow.stop();
        }
        if any_started {
            tokio::time::sleep(self.config.grace_period).await;
        }
        for flow in &self.flows {
            let _ = flow.finalize().await;
        }
        self.phase = ScenarioPhase::Aborted;
        self.diagnostics.event(DiagnosticEvent::RunAborted {
            reason: "caller-initiated abort",
        });
    }

    /// Render the finalized snapshot through every registered sink, in
    /// registration order. Pure read: calling twice produces identical
    /// output.
    pub fn report(&self) -> ScenarioResult<Vec<PathBuf>> {
        let snapshot = match (&self.snapshot, self.phase) {
            (Some(snapshot), ScenarioPhase::Finalized) => snapshot,
            _ => {
                return Err(ScenarioError::InvalidState {
                    operation: "report",
                    phase: self.phase,
                })
            }
        };

        let mut outputs = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            outputs.push(sink.render(snapshot)?);
        }
        Ok(outputs)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}
