use serde::Serialize;
use std::time::Duration;

use crate::analysis::error::AnalysisResult;

/// One observed traffic unit (frame, segment or voice packet).
///
/// Timestamps are relative to the flow's start so a recorded series is
/// self-contained and finalization never consults the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficSample {
    /// Emission-order sequence number, starting at 0.
    pub sequence: u64,
    /// Offset from flow start at which the unit was emitted.
    pub emitted_at: Duration,
    /// Payload size of the unit.
    pub bytes: u64,
    /// Offset from flow start at which the unit arrived, `None` if the
    /// link dropped it.
    pub received_at: Option<Duration>,
    /// One-way delay, present only when the flow embedded a latency tag
    /// and the unit arrived.
    pub latency: Option<Duration>,
}

impl TrafficSample {
    pub fn is_received(&self) -> bool {
        self.received_at.is_some()
    }
}

/// Inputs the scenario provides when finalizing an analyser.
#[derive(Debug, Clone, Copy)]
pub struct FinalizeContext {
    /// Sender-side truth for how many units the flow emitted. Loss is
    /// computed against this, never inferred from the receive side.
    pub expected_count: u64,
    /// Whether the flow embedded send timestamps in its traffic.
    pub latency_tagged: bool,
}

/// Pass/fail evaluation of a summary against its configured thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", content = "detail")]
pub enum Verdict {
    Pass,
    Fail(String),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// One point of a plottable time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Bucket start, seconds from flow start.
    pub offset_secs: f64,
    pub value: f64,
}

/// Latency statistics over the tagged samples of one flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    pub minimum: Duration,
    pub average: Duration,
    pub maximum: Duration,
    /// Mean absolute delta between consecutive one-way delays.
    pub jitter: Duration,
}

/// Finalized summary of one analyser, tagged by analyser kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum AnalyserSummary {
    Throughput {
        total_bytes: u64,
        /// Average goodput in bits per second between the first and last
        /// received sample.
        average_bps: f64,
        verdict: Verdict,
    },
    LossLatency {
        expected: u64,
        received: u64,
        lost: u64,
        loss_ratio: f64,
        /// `None` when latency tagging was disabled on the flow.
        latency: Option<LatencyStats>,
        verdict: Verdict,
    },
    Voice {
        expected: u64,
        received: u64,
        loss_ratio: f64,
        latency: Option<LatencyStats>,
        /// Estimated mean opinion score, `None` when no samples arrived.
        mos: Option<f64>,
        verdict: Verdict,
    },
}

impl AnalyserSummary {
    pub fn verdict(&self) -> &Verdict {
        match self {
            AnalyserSummary::Throughput { verdict, .. }
            | AnalyserSummary::LossLatency { verdict, .. }
            | AnalyserSummary::Voice { verdict, .. } => verdict,
        }
    }
}

/// Summary plus the raw series an analyser hands back at finalization.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyserOutput {
    pub summary: AnalyserSummary,
    pub series: Vec<SeriesPoint>,
}

/// Per-analyser entry of the finalized scenario snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyserReport {
    pub label: String,
    #[serde(flatten)]
    pub outcome: AnalyserOutcome,
}

/// Either a finalized result or an explicit "unavailable" marker; an
/// analyser that failed to finalize degrades the report, never the run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "result")]
pub enum AnalyserOutcome {
    Finalized(AnalyserOutput),
    Unavailable { reason: String },
}

impl AnalyserReport {
    pub fn is_available(&self) -> bool {
        matches!(self.outcome, AnalyserOutcome::Finalized(_))
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match &self.outcome {
            AnalyserOutcome::Finalized(output) => Some(output.summary.verdict()),
            AnalyserOutcome::Unavailable { .. } => None,
        }
    }
}

/// Metric collector bound to exactly one flow.
///
/// `on_sample` runs on the flow's emission path and must not block or
/// aggregate; `finalize` is called exactly once after the flow reached its
/// finalized state and must be deterministic over the recorded series.
pub trait Analyser: Send {
    /// Label used in reports, e.g. `"Latency and frame loss"`.
    fn label(&self) -> &str;

    /// Record one observation. Append-only; aggregation happens in
    /// `finalize`.
    fn on_sample(&mut self, sample: &TrafficSample);

    /// Convert the accumulated series into a summary. Called once.
    fn finalize(&mut self, ctx: &FinalizeContext) -> AnalysisResult<AnalyserOutput>;
}

/// Shared helper: latency statistics over the received, tagged samples.
pub(crate) fn latency_stats(samples: &[TrafficSample]) -> Option<LatencyStats> {
    let latencies: Vec<Duration> = samples.iter().filter_map(|s| s.latency).collect();
    if latencies.is_empty() {
        return None;
    }

    let minimum = *latencies.iter().min().unwrap();
    let maximum = *latencies.iter().max().unwrap();
    let total: Duration = latencies.iter().sum();
    let average = total / latencies.len() as u32;

    let jitter = if latencies.len() < 2 {
        Duration::ZERO
    } else {
        let deltas: u128 = latencies
            .windows(2)
            .map(|w| w[0].abs_diff(w[1]).as_nanos())
            .sum();
        Duration::from_nanos((deltas / (latencies.len() as u128 - 1)) as u64)
    };

    Some(LatencyStats {
        minimum,
        average,
        maximum,
        jitter,
    })
}

/// Shared helper: bucket received bytes into fixed-width intervals and
/// return each bucket's goodput in bits per second.
pub(crate) fn goodput_series(samples: &[TrafficSample], bucket: Duration) -> Vec<SeriesPoint> {
    let bucket_secs = bucket.as_secs_f64();
    if bucket_secs <= 0.0 {
        return Vec::new();
    }

    let mut buckets: Vec<u64> = Vec::new();
    for sample in samples.iter().filter(|s| s.is_received()) {
        let index = (sample.emitted_at.as_secs_f64() / bucket_secs) as usize;
        if index >= buckets.len() {
            buckets.resize(index + 1, 0);
        }
        buckets[index] += sample.bytes;
    }

    buckets
        .iter()
        .enumerate()
        .map(|(i, bytes)| SeriesPoint {
            offset_secs: i as f64 * bucket_secs,
            value: *bytes as f64 * 8.0 / bucket_secs,
        })
        .collect()
}
