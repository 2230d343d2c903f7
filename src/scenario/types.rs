use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::flow::FlowReport;

/// Scenario orchestration lifecycle. A scenario runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioPhase {
    Idle,
    Running,
    Finalized,
    Aborted,
}

/// Timing policy of one scenario run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioConfig {
    /// Bounded wait between the stop signal and finalization, allowing
    /// in-flight traffic to land so loss accounting is accurate.
    pub grace_period: Duration,
    /// How often the orchestrator re-checks flow completion while waiting
    /// for the stop condition.
    pub poll_interval: Duration,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(2),
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Immutable post-finalize view of a scenario run: per-flow configuration
/// identities, completion status and all analyser results.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSnapshot {
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    /// Effective stop deadline the run was held to.
    pub effective_deadline: Duration,
    /// Time from start until the stop signal was issued.
    pub traffic_elapsed: Duration,
    /// Full run time including grace period and finalization.
    pub total_elapsed: Duration,
    pub flows: Vec<FlowReport>,
}

impl ScenarioSnapshot {
    /// Number of flow+analyser pairs in the snapshot.
    pub fn analyser_count(&self) -> usize {
        self.flows.iter().map(|f| f.analysers.len()).sum()
    }

    /// Flow+analyser pairs whose verdict failed its threshold.
    pub fn failure_count(&self) -> usize {
        self.flows
            .iter()
            .flat_map(|f| &f.analysers)
            .filter(|a| matches!(a.verdict(), Some(v) if !v.is_pass()))
            .count()
    }

    /// Analysers whose finalization failed and were marked unavailable.
    pub fn unavailable_count(&self) -> usize {
        self.flows
            .iter()
            .flat_map(|f| &f.analysers)
            .filter(|a| !a.is_available())
            .count()
    }
}
