use std::collections::HashSet;
use std::time::Duration;

use crate::analysis::error::{AnalysisError, AnalysisResult};
use crate::analysis::types::{
    goodput_series, latency_stats, Analyser, AnalyserOutput, AnalyserSummary, FinalizeContext,
    TrafficSample, Verdict,
};

const SERIES_BUCKET: Duration = Duration::from_secs(1);

/// Frame loss and latency analyser for frame-blasting flows.
///
/// Loss is sender-derived: expected count comes from the flow's configured
/// send count, and missing sequence numbers in the recorded series are
/// counted as lost at finalize time. The scenario's grace period has
/// already elapsed by then, so a gap means lost rather than in flight.
/// Latency requires the flow to embed send timestamps; without tagging the
/// summary reports latency as unavailable instead of failing.
pub struct LatencyFrameLossAnalyser {
    samples: Vec<TrafficSample>,
    max_loss_ratio: f64,
    max_average_latency: Option<Duration>,
    finalized: bool,
}

impl LatencyFrameLossAnalyser {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            // Any loss fails by default, matching unit-test report semantics.
            max_loss_ratio: 0.0,
            max_average_latency: None,
            finalized: false,
        }
    }

    /// Tolerate loss up to this ratio before failing the verdict.
    pub fn with_max_loss_ratio(mut self, ratio: f64) -> Self {
        self.max_loss_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Fail the verdict when average latency exceeds this bound.
    pub fn with_max_average_latency(mut self, latency: Duration) -> Self {
        self.max_average_latency = Some(latency);
        self
    }
}

impl Default for LatencyFrameLossAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyser for LatencyFrameLossAnalyser {
    fn label(&self) -> &str {
        "Latency and frame loss"
    }

    fn on_sample(&mut self, sample: &TrafficSample) {
        if !self.finalized {
            self.samples.push(*sample);
        }
    }

    fn finalize(&mut self, ctx: &FinalizeContext) -> AnalysisResult<AnalyserOutput> {
        if self.finalized {
            return Err(AnalysisError::AlreadyFinalized);
        }
        self.finalized = true;

        let mut seen = HashSet::new();
        for sample in self.samples.iter().filter(|s| s.is_received()) {
            if !seen.insert(sample.sequence) {
                return Err(AnalysisError::SequenceAccounting(format!(
                    "duplicate sequence number {}",
                    sample.sequence
                )));
            }
        }

        let expected = ctx.expected_count;
        let received = seen.len() as u64;
        if received > expected {
            return Err(AnalysisError::SequenceAccounting(format!(
                "received {received} frames but sender emitted only {expected}"
            )));
        }
        let lost = expected - received;
        let loss_ratio = if expected > 0 {
            lost as f64 / expected as f64
        } else {
            0.0
        };

        let latency = if ctx.latency_tagged {
            latency_stats(&self.samples)
        } else {
            None
        };

        let mut failures = Vec::new();
        if loss_ratio > self.max_loss_ratio {
            failures.push(format!(
                "loss ratio {loss_ratio:.4} exceeds threshold {:.4}",
                self.max_loss_ratio
            ));
        }
        if let (Some(bound), Some(stats)) = (self.max_average_latency, &latency) {
            if stats.average > bound {
                failures.push(format!(
                    "average latency {:?} exceeds threshold {bound:?}",
                    stats.average
                ));
            }
        }
        let verdict = if failures.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail(failures.join("; "))
        };

        Ok(AnalyserOutput {
            summary: AnalyserSummary::LossLatency {
                expected,
                received,
                lost,
                loss_ratio,
                latency,
                verdict,
            },
            series: goodput_series(&self.samples, SERIES_BUCKET),
        })
    }
}
