use std::collections::HashSet;
use std::time::Duration;

use crate::analysis::error::{AnalysisError, AnalysisResult};
use crate::analysis::types::{
    goodput_series, latency_stats, Analyser, AnalyserOutput, AnalyserSummary, FinalizeContext,
    TrafficSample, Verdict,
};

const SERIES_BUCKET: Duration = Duration::from_secs(1);

/// Fixed jitter-buffer delay added to the network one-way delay when
/// evaluating the delay impairment.
const JITTER_BUFFER: Duration = Duration::from_millis(40);

/// Voice quality analyser: composes loss, latency and jitter into a mean
/// opinion score estimate using a fixed E-model-style degradation mapping.
///
/// An empty sample series reports "no data" (no MOS), never an error.
pub struct VoiceAnalyser {
    samples: Vec<TrafficSample>,
    min_mos: f64,
    finalized: bool,
}

impl VoiceAnalyser {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            min_mos: 4.0,
            finalized: false,
        }
    }

    /// Fail the verdict when the estimated MOS drops below this value.
    pub fn with_min_mos(mut self, mos: f64) -> Self {
        self.min_mos = mos;
        self
    }
}

impl Default for VoiceAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

/// R-factor for a G.711 call with the given one-way delay and loss ratio,
/// then mapped onto the 1.0..=4.5 MOS scale. The constants are the fixed
/// degradation model; the mapping is deterministic.
fn estimate_mos(one_way_delay: Duration, loss_ratio: f64) -> f64 {
    let delay_ms = (one_way_delay + JITTER_BUFFER).as_secs_f64() * 1000.0;

    // Delay impairment Id.
    let mut id = 0.024 * delay_ms;
    if delay_ms > 177.3 {
        id += 0.11 * (delay_ms - 177.3);
    }

    // Equipment impairment Ie for G.711 under random loss.
    let ie = 30.0 * (1.0 + 15.0 * loss_ratio).ln();

    let r = (93.2 - id - ie).clamp(0.0, 100.0);

    if r <= 0.0 {
        1.0
    } else if r >= 100.0 {
        4.5
    } else {
        1.0 + 0.035 * r + 7.0e-6 * r * (r - 60.0) * (100.0 - r)
    }
}

impl Analyser for VoiceAnalyser {
    fn label(&self) -> &str {
        "Voice quality"
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

        let received: HashSet<u64> = self
            .samples
            .iter()
            .filter(|s| s.is_received())
            .map(|s| s.sequence)
            .collect();
        let received = received.len() as u64;
        let expected = ctx.expected_count.max(received);
        let loss_ratio = if expected > 0 {
            (expected - received) as f64 / expected as f64
        } else {
            0.0
        };

        let latency = if ctx.latency_tagged {
            latency_stats(&self.samples)
        } else {
            None
        };

        let mos = if received == 0 {
            // No data: the call never got through, nothing to score.
            None
        } else {
            let delay = latency
                .map(|stats| stats.average + stats.jitter)
                .unwrap_or(Duration::ZERO);
            Some(estimate_mos(delay, loss_ratio))
        };

        let verdict = match mos {
            Some(score) if score < self.min_mos => Verdict::Fail(format!(
                "estimated MOS {score:.2} below threshold {:.2}",
                self.min_mos
            )),
            Some(_) => Verdict::Pass,
            None => Verdict::Fail("no voice packets arrived".into()),
        };

        Ok(AnalyserOutput {
            summary: AnalyserSummary::Voice {
                expected,
                received,
                loss_ratio,
                latency,
                mos,
                verdict,
            },
            series: goodput_series(&self.samples, SERIES_BUCKET),
        })
    }
}
