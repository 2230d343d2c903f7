use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::{AnalyserOutcome, AnalyserSummary, Verdict};
use crate::report::error::ReportResult;
use crate::report::{file_timestamp, ReportSink};
use crate::scenario::ScenarioSnapshot;

/// Human-readable report: a structured plain-text document with one
/// section per flow and one line per analyser summary.
pub struct TextReport {
    output_dir: PathBuf,
}

impl TextReport {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

fn fmt_duration(duration: Duration) -> String {
    format!("{:.3}s", duration.as_secs_f64())
}

fn fmt_bps(bps: f64) -> String {
    if bps >= 1_000_000.0 {
        format!("{:.2} Mbit/s", bps / 1_000_000.0)
    } else if bps >= 1_000.0 {
        format!("{:.2} kbit/s", bps / 1_000.0)
    } else {
        format!("{bps:.0} bit/s")
    }
}

fn verdict_tag(verdict: &Verdict) -> &'static str {
    if verdict.is_pass() {
        "PASS"
    } else {
        "FAIL"
    }
}

fn summary_line(summary: &AnalyserSummary) -> String {
    match summary {
        AnalyserSummary::Throughput {
            total_bytes,
            average_bps,
            verdict,
        } => format!(
            "[{}] {} total, average {}",
            verdict_tag(verdict),
            total_bytes,
            fmt_bps(*average_bps)
        ),
        AnalyserSummary::LossLatency {
            expected,
            received,
            lost,
            loss_ratio,
            latency,
            verdict,
        } => {
            let latency = match latency {
                Some(stats) => format!(
                    ", latency min/avg/max {}/{}/{} jitter {}",
                    fmt_duration(stats.minimum),
                    fmt_duration(stats.average),
                    fmt_duration(stats.maximum),
                    fmt_duration(stats.jitter)
                ),
                None => ", latency unavailable".to_string(),
            };
            format!(
                "[{}] {received}/{expected} frames received, {lost} lost ({:.2}%){latency}",
                verdict_tag(verdict),
                loss_ratio * 100.0
            )
        }
        AnalyserSummary::Voice {
            received,
            expected,
            loss_ratio,
            mos,
            verdict,
            ..
        } => {
            let mos = match mos {
                Some(score) => format!("MOS {score:.2}"),
                None => "no data".to_string(),
            };
            format!(
                "[{}] {mos}, {received}/{expected} packets received ({:.2}% loss)",
                verdict_tag(verdict),
                loss_ratio * 100.0
            )
        }
    }
}

impl ReportSink for TextReport {
    fn label(&self) -> &'static str {
        "text"
    }

    fn render(&self, snapshot: &ScenarioSnapshot) -> ReportResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("flowbench_{}.txt", file_timestamp(snapshot)));

        let mut out = String::new();
        let _ = writeln!(out, "Scenario report");
        let _ = writeln!(out, "===============");
        let _ = writeln!(out, "Started:            {}", snapshot.started_at);
        let _ = writeln!(out, "Stopped:            {}", snapshot.stopped_at);
        let _ = writeln!(
            out,
            "Effective deadline: {}",
            fmt_duration(snapshot.effective_deadline)
        );
        let _ = writeln!(
            out,
            "Traffic time:       {}",
            fmt_duration(snapshot.traffic_elapsed)
        );
        let _ = writeln!(
            out,
            "Total run time:     {}",
            fmt_duration(snapshot.total_elapsed)
        );

        for flow in &snapshot.flows {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Flow '{}' ({}) {} -> {}",
                flow.name, flow.kind, flow.source, flow.destination
            );
            let _ = writeln!(
                out,
                "  completion: {:?}, {} units / {} bytes sent",
                flow.completion, flow.units_sent, flow.bytes_sent
            );
            if flow.analysers.is_empty() {
                let _ = writeln!(out, "  no analysers attached");
            }
            for analyser in &flow.analysers {
                match &analyser.outcome {
                    AnalyserOutcome::Finalized(output) => {
                        let _ = writeln!(
                            out,
                            "  {}: {}",
                            analyser.label,
                            summary_line(&output.summary)
                        );
                    }
                    AnalyserOutcome::Unavailable { reason } => {
                        let _ =
                            writeln!(out, "  {}: [UNAVAILABLE] {reason}", analyser.label);
                    }
                }
            }
        }

        fs::write(&path, out)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::snapshot_with_failure;
    use tempfile::TempDir;

    #[test]
    fn renders_all_flows_and_verdicts() {
        let dir = TempDir::new().unwrap();
        let sink = TextReport::new(dir.path());
        let snapshot = snapshot_with_failure();

        let path = sink.render(&snapshot).unwrap();
        let body = fs::read_to_string(path).unwrap();

        assert!(body.contains("Downstream TCP flow"));
        assert!(body.contains("Downstream UDP flow"));
        assert!(body.contains("[PASS]"));
        assert!(body.contains("[FAIL]"));
        assert!(body.contains("[UNAVAILABLE]"));
        assert!(body.contains("latency unavailable"));
    }
}
