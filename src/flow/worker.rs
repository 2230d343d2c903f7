use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::analysis::{Analyser, TrafficSample};
use crate::endpoint::LinkProfile;
use crate::flow::types::{EmissionSchedule, FlowState};

/// Everything the per-flow worker task needs, cloned out of the flow so
/// the task borrows nothing.
pub(crate) struct WorkerContext {
    pub flow_name: String,
    pub schedule: EmissionSchedule,
    pub link: LinkProfile,
    pub state: Arc<RwLock<FlowState>>,
    pub analysers: Arc<Mutex<Vec<Box<dyn Analyser>>>>,
    pub units_sent: Arc<AtomicU64>,
    pub bytes_sent: Arc<AtomicU64>,
}

/// Emission loop: one unit per schedule interval until the completion
/// policy is satisfied or the stop signal arrives. Samples are delivered
/// to the attached analysers synchronously, in emission order.
pub(crate) async fn run(ctx: WorkerContext, mut stop_rx: watch::Receiver<bool>) {
    let started = Instant::now();
    let deadline = ctx.schedule.duration.map(|duration| started + duration);
    let mut interval = tokio::time::interval(ctx.schedule.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut rng = StdRng::from_entropy();
    let mut sequence: u64 = 0;

    loop {
        if let Some(count) = ctx.schedule.count {
            if sequence >= count {
                complete_naturally(&ctx);
                break;
            }
        }

        // `biased` keeps the poll order fixed: a pending stop signal or an
        // elapsed duration always wins over a simultaneously ready tick, so
        // no unit is emitted past either boundary.
        tokio::select! {
            biased;

            _ = stop_rx.changed() => {
                // Stop signal; the flow state was already set by `stop()`.
                break;
            }
            _ = sleep_until_deadline(deadline) => {
                // Duration expiry must not wait for the next tick; at low
                // emission rates the tick may be far beyond the deadline.
                complete_naturally(&ctx);
                break;
            }
            _ = interval.tick() => {
                if deadline.is_some_and(|at| Instant::now() >= at) {
                    complete_naturally(&ctx);
                    break;
                }
                emit(&ctx, sequence, started.elapsed(), &mut rng);
                sequence += 1;
            }
        }
    }

    tracing::debug!(
        flow = %ctx.flow_name,
        units = sequence,
        "emission worker exited"
    );
}

/// Pending forever for schedules without a duration bound.
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Emit one traffic unit: apply the link profile to decide arrival and
/// delay, then report the sample to every analyser.
fn emit(ctx: &WorkerContext, sequence: u64, emitted_at: Duration, rng: &mut StdRng) {
    let lost = ctx.link.loss_rate > 0.0 && rng.gen::<f64>() < ctx.link.loss_rate;
    let delay = if ctx.link.jitter > Duration::ZERO {
        ctx.link.latency + ctx.link.jitter.mul_f64(rng.gen::<f64>())
    } else {
        ctx.link.latency
    };

    let sample = TrafficSample {
        sequence,
        emitted_at,
        bytes: ctx.schedule.unit_bytes,
        received_at: (!lost).then(|| emitted_at + delay),
        latency: (!lost && ctx.schedule.latency_tag).then_some(delay),
    };

    ctx.units_sent.fetch_add(1, Ordering::Relaxed);
    ctx.bytes_sent
        .fetch_add(ctx.schedule.unit_bytes, Ordering::Relaxed);

    let mut analysers = ctx.analysers.lock();
    for analyser in analysers.iter_mut() {
        analyser.on_sample(&sample);
    }
}

/// Mark the flow naturally completed unless it was stopped in the
/// meantime.
fn complete_naturally(ctx: &WorkerContext) {
    let mut state = ctx.state.write();
    if *state == FlowState::Running {
        *state = FlowState::NaturallyCompleted;
        tracing::debug!(flow = %ctx.flow_name, "flow naturally completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, AnalyserOutput, FinalizeContext};

    /// Analyser stub sharing its recorded samples with the test.
    struct SampleRecorder {
        samples: Arc<Mutex<Vec<TrafficSample>>>,
    }

    impl Analyser for SampleRecorder {
        fn label(&self) -> &str {
            "sample recorder"
        }

        fn on_sample(&mut self, sample: &TrafficSample) {
            self.samples.lock().push(*sample);
        }

        fn finalize(&mut self, _ctx: &FinalizeContext) -> AnalysisResult<AnalyserOutput> {
            unreachable!("not finalized in worker tests")
        }
    }

    fn context(
        schedule: EmissionSchedule,
        link: LinkProfile,
    ) -> (WorkerContext, Arc<Mutex<Vec<TrafficSample>>>) {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let recorder = SampleRecorder {
            samples: Arc::clone(&samples),
        };
        let ctx = WorkerContext {
            flow_name: "worker test".into(),
            schedule,
            link,
            state: Arc::new(RwLock::new(FlowState::Running)),
            analysers: Arc::new(Mutex::new(vec![Box::new(recorder)])),
            units_sent: Arc::new(AtomicU64::new(0)),
            bytes_sent: Arc::new(AtomicU64::new(0)),
        };
        (ctx, samples)
    }

    fn fast_schedule(count: Option<u64>) -> EmissionSchedule {
        EmissionSchedule {
            interval: Duration::from_micros(100),
            unit_bytes: 100,
            count,
            duration: None,
            latency_tag: false,
        }
    }

    #[tokio::test]
    async fn emits_exactly_the_configured_count_in_order() {
        let (ctx, samples) = context(fast_schedule(Some(25)), LinkProfile::default());
        let state = Arc::clone(&ctx.state);
        let units = Arc::clone(&ctx.units_sent);
        let (_stop_tx, stop_rx) = watch::channel(false);

        run(ctx, stop_rx).await;

        assert_eq!(units.load(Ordering::Relaxed), 25);
        assert_eq!(*state.read(), FlowState::NaturallyCompleted);

        let samples = samples.lock();
        let sequences: Vec<u64> = samples.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, (0..25).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn duration_expires_between_ticks() {
        // 500 ms interval against a 100 ms duration: the expiry falls long
        // before the second tick and must end the loop on its own.
        let schedule = EmissionSchedule {
            interval: Duration::from_millis(500),
            unit_bytes: 100,
            count: None,
            duration: Some(Duration::from_millis(100)),
            latency_tag: false,
        };
        let (ctx, samples) = context(schedule, LinkProfile::default());
        let state = Arc::clone(&ctx.state);
        let (_stop_tx, stop_rx) = watch::channel(false);

        let started = Instant::now();
        run(ctx, stop_rx).await;

        assert!(
            started.elapsed() < Duration::from_millis(400),
            "worker waited for a tick past the duration"
        );
        assert_eq!(*state.read(), FlowState::NaturallyCompleted);
        assert_eq!(samples.lock().len(), 1);
    }

    #[tokio::test]
    async fn prior_stop_signal_emits_nothing() {
        let (ctx, samples) = context(fast_schedule(None), LinkProfile::default());
        let units = Arc::clone(&ctx.units_sent);
        let (stop_tx, stop_rx) = watch::channel(false);
        stop_tx.send(true).unwrap();

        run(ctx, stop_rx).await;

        assert!(samples.lock().is_empty());
        assert_eq!(units.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn stop_signal_ends_unbounded_emission() {
        let (ctx, _samples) = context(fast_schedule(None), LinkProfile::default());
        let units = Arc::clone(&ctx.units_sent);
        let (stop_tx, stop_rx) = watch::channel(false);

        let worker = tokio::spawn(run(ctx, stop_rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        stop_tx.send(true).unwrap();
        worker.await.unwrap();

        assert!(units.load(Ordering::Relaxed) > 0);
    }

    #[tokio::test]
    async fn full_loss_link_drops_every_unit() {
        let (ctx, samples) = context(fast_schedule(Some(10)), LinkProfile::with_loss(1.0));
        let (_stop_tx, stop_rx) = watch::channel(false);

        run(ctx, stop_rx).await;

        let samples = samples.lock();
        assert_eq!(samples.len(), 10);
        assert!(samples.iter().all(|s| !s.is_received()));
    }

    #[tokio::test]
    async fn fixed_latency_link_tags_every_unit() {
        let schedule = EmissionSchedule {
            latency_tag: true,
            ..fast_schedule(Some(5))
        };
        let link = LinkProfile::with_latency(Duration::from_millis(7));
        let (ctx, samples) = context(schedule, link);
        let (_stop_tx, stop_rx) = watch::channel(false);

        run(ctx, stop_rx).await;

        let samples = samples.lock();
        assert_eq!(samples.len(), 5);
        assert!(samples
            .iter()
            .all(|s| s.latency == Some(Duration::from_millis(7))));
    }
}
