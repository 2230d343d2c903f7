//! Reporting module.
//!
//! A report sink consumes the finalized scenario snapshot exactly once per
//! `report` call and renders it to one output format. Three sinks ship
//! with the engine: a human-readable text document, a JSON summary and a
//! JUnit XML document for CI integration. Output filenames derive from the
//! run's start timestamp, so re-rendering the same snapshot writes
//! identical files.

pub mod error;
mod json;
mod junit;
mod text;

pub use error::{ReportError, ReportResult};
pub use json::JsonReport;
pub use junit::JUnitReport;
pub use text::TextReport;

use std::path::PathBuf;

use crate::scenario::ScenarioSnapshot;

/// Renders one finalized scenario snapshot to one output format.
///
/// Sinks are stateless apart from their output target; `render` must not
/// mutate anything observable, so repeated calls yield identical output.
pub trait ReportSink: Send {
    fn label(&self) -> &'static str;

    fn render(&self, snapshot: &ScenarioSnapshot) -> ReportResult<PathBuf>;
}

/// Timestamp fragment shared by all sink filenames.
pub(crate) fn file_timestamp(snapshot: &ScenarioSnapshot) -> String {
    snapshot.started_at.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use chrono::TimeZone;

    use crate::analysis::{
        AnalyserOutcome, AnalyserOutput, AnalyserReport, AnalyserSummary, Verdict,
    };
    use crate::flow::{FlowCompletion, FlowReport};
    use crate::scenario::ScenarioSnapshot;

    /// Fixture: one passing stream flow and one frame-blasting flow with a
    /// failed loss verdict plus an unavailable analyser.
    pub(crate) fn snapshot_with_failure() -> ScenarioSnapshot {
        let throughput = AnalyserReport {
            label: "Average goodput".into(),
            outcome: AnalyserOutcome::Finalized(AnalyserOutput {
                summary: AnalyserSummary::Throughput {
                    total_bytes: 5_000_000,
                    average_bps: 4_000_000.0,
                    verdict: Verdict::Pass,
                },
                series: Vec::new(),
            }),
        };
        let loss = AnalyserReport {
            label: "Latency and frame loss".into(),
            outcome: AnalyserOutcome::Finalized(AnalyserOutput {
                summary: AnalyserSummary::LossLatency {
                    expected: 10_000,
                    received: 9_900,
                    lost: 100,
                    loss_ratio: 0.01,
                    latency: None,
                    verdict: Verdict::Fail("loss ratio 0.0100 exceeds threshold 0.0000".into()),
                },
                series: Vec::new(),
            }),
        };
        let broken = AnalyserReport {
            label: "Voice quality".into(),
            outcome: AnalyserOutcome::Unavailable {
                reason: "Analyser already finalized".into(),
            },
        };

        ScenarioSnapshot {
            started_at: chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            stopped_at: chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 12).unwrap(),
            effective_deadline: Duration::from_secs(12),
            traffic_elapsed: Duration::from_secs(12),
            total_elapsed: Duration::from_secs(14),
            flows: vec![
                FlowReport {
                    name: "Downstream TCP flow".into(),
                    kind: "stream",
                    source: "WAN".into(),
                    destination: "CPE".into(),
                    completion: FlowCompletion::NaturallyCompleted,
                    units_sent: 3_500,
                    bytes_sent: 5_110_000,
                    analysers: vec![throughput],
                },
                FlowReport {
                    name: "Downstream UDP flow".into(),
                    kind: "frame-blasting",
                    source: "WAN".into(),
                    destination: "CPE".into(),
                    completion: FlowCompletion::StoppedByDeadline,
                    units_sent: 10_000,
                    bytes_sent: 10_240_000,
                    analysers: vec![loss, broken],
                },
            ],
        }
    }
}
