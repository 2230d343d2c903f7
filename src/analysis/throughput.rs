use std::time::Duration;

use crate::analysis::error::{AnalysisError, AnalysisResult};
use crate::analysis::types::{
    goodput_series, Analyser, AnalyserOutput, AnalyserSummary, FinalizeContext, TrafficSample,
    Verdict,
};

const SERIES_BUCKET: Duration = Duration::from_secs(1);

/// Average goodput analyser for stream-oriented (HTTP/TCP-like) flows.
///
/// Summary is total received bytes over the wall time between the first
/// and last sample; the 1 s-bucketed series is kept for plotting.
pub struct HttpAnalyser {
    samples: Vec<TrafficSample>,
    min_average_bps: Option<f64>,
    finalized: bool,
}

impl HttpAnalyser {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            min_average_bps: None,
            finalized: false,
        }
    }

    /// Fail the verdict when average goodput drops below this rate.
    pub fn with_min_average_bps(mut self, bps: f64) -> Self {
        self.min_average_bps = Some(bps);
        self
    }
}

impl Default for HttpAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyser for HttpAnalyser {
    fn label(&self) -> &str {
        "Average goodput"
    }

    fn on_sample(&mut self, sample: &TrafficSample) {
        if !self.finalized {
            self.samples.push(*sample);
        }
    }

    fn finalize(&mut self, _ctx: &FinalizeContext) -> AnalysisResult<AnalyserOutput> {
        if self.finalized {
            return Err(AnalysisError::AlreadyFinalized);
        }
        self.finalized = true;

        let received: Vec<&TrafficSample> =
            self.samples.iter().filter(|s| s.is_received()).collect();
        let total_bytes: u64 = received.iter().map(|s| s.bytes).sum();

        let elapsed = match (received.first(), received.last()) {
            (Some(first), Some(last)) => last.emitted_at.saturating_sub(first.emitted_at),
            _ => Duration::ZERO,
        };
        let average_bps = if elapsed > Duration::ZERO {
            total_bytes as f64 * 8.0 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let verdict = match self.min_average_bps {
            Some(min) if average_bps < min => Verdict::Fail(format!(
                "average goodput {average_bps:.0} bps below threshold {min:.0} bps"
            )),
            _ => Verdict::Pass,
        };

        Ok(AnalyserOutput {
            summary: AnalyserSummary::Throughput {
                total_bytes,
                average_bps,
                verdict,
            },
            series: goodput_series(&self.samples, SERIES_BUCKET),
        })
    }
}
