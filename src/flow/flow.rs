use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::analysis::{Analyser, AnalyserOutcome, AnalyserReport, FinalizeContext};
use crate::endpoint::{Endpoint, LinkProfile};
use crate::flow::blasting::FrameBlastingConfig;
use crate::flow::error::{FlowError, FlowResult};
use crate::flow::stream::StreamConfig;
use crate::flow::types::{
    CompletionPolicy, EmissionSchedule, FlowCompletion, FlowReport, FlowState,
};
use crate::flow::voice::VoiceConfig;
use crate::flow::worker::{self, WorkerContext};

/// Closed set of traffic generator variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowKind {
    Stream(StreamConfig),
    FrameBlasting(FrameBlastingConfig),
    Isochronous(VoiceConfig),
}

impl FlowKind {
    pub fn name(&self) -> &'static str {
        match self {
            FlowKind::Stream(_) => "stream",
            FlowKind::FrameBlasting(_) => "frame-blasting",
            FlowKind::Isochronous(_) => "isochronous",
        }
    }
}

/// One directional traffic definition between two endpoints.
///
/// Created detached; becomes active when its owning scenario runs. The
/// flow does not own endpoint lifecycle, only references the handles.
pub struct Flow {
    name: String,
    kind: FlowKind,
    source: Arc<dyn Endpoint>,
    destination: Arc<dyn Endpoint>,
    link: LinkProfile,
    schedule: EmissionSchedule,
    state: Arc<RwLock<FlowState>>,
    analysers: Arc<Mutex<Vec<Box<dyn Analyser>>>>,
    units_sent: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Flow {
    /// Build a flow of the given kind; configuration is validated here and
    /// contradictory parameter combinations fail fast.
    pub fn new(
        kind: FlowKind,
        source: Arc<dyn Endpoint>,
        destination: Arc<dyn Endpoint>,
        name: impl Into<String>,
    ) -> FlowResult<Self> {
        let schedule = match &kind {
            FlowKind::Stream(config) => config.validate()?,
            FlowKind::FrameBlasting(config) => config.validate()?,
            FlowKind::Isochronous(config) => config.validate()?,
        };

        Ok(Self {
            name: name.into(),
            kind,
            source,
            destination,
            link: LinkProfile::default(),
            schedule,
            state: Arc::new(RwLock::new(FlowState::Created)),
            analysers: Arc::new(Mutex::new(Vec::new())),
            units_sent: Arc::new(AtomicU64::new(0)),
            bytes_sent: Arc::new(AtomicU64::new(0)),
            stop_tx: Mutex::new(None),
            worker: Mutex::new(None),
        })
    }

    pub fn stream(
        source: Arc<dyn Endpoint>,
        destination: Arc<dyn Endpoint>,
        name: impl Into<String>,
        config: StreamConfig,
    ) -> FlowResult<Self> {
        Self::new(FlowKind::Stream(config), source, destination, name)
    }

    pub fn frame_blasting(
        source: Arc<dyn Endpoint>,
        destination: Arc<dyn Endpoint>,
        name: impl Into<String>,
        config: FrameBlastingConfig,
    ) -> FlowResult<Self> {
        Self::new(FlowKind::FrameBlasting(config), source, destination, name)
    }

    pub fn voice(
        source: Arc<dyn Endpoint>,
        destination: Arc<dyn Endpoint>,
        name: impl Into<String>,
        config: VoiceConfig,
    ) -> FlowResult<Self> {
        Self::new(FlowKind::Isochronous(config), source, destination, name)
    }

    /// Set the impairment profile of the source->destination path.
    pub fn with_link(mut self, link: LinkProfile) -> Self {
        self.link = link;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FlowKind {
        &self.kind
    }

    pub fn state(&self) -> FlowState {
        *self.state.read()
    }

    pub fn completion_policy(&self) -> CompletionPolicy {
        self.schedule.policy()
    }

    pub fn units_sent(&self) -> u64 {
        self.units_sent.load(Ordering::Relaxed)
    }

    /// Expected natural completion time, `None` for unbounded flows. Feeds
    /// the scenario's stop-deadline derivation.
    pub fn expected_duration(&self) -> Option<Duration> {
        match self.schedule.policy() {
            CompletionPolicy::FixedDuration(duration) => Some(duration),
            CompletionPolicy::FixedCount(count) => Some(Duration::from_secs_f64(
                self.schedule.interval.as_secs_f64() * count as f64,
            )),
            CompletionPolicy::Unbounded => None,
        }
    }

    /// Attach a metric collector. Valid only before the flow starts;
    /// insertion order is preserved for sample delivery.
    pub fn attach_analyser(&self, analyser: Box<dyn Analyser>) -> FlowResult<()> {
        let state = *self.state.read();
        if state != FlowState::Created {
            return Err(FlowError::InvalidState {
                operation: "attach_analyser",
                state,
            });
        }
        self.analysers.lock().push(analyser);
        Ok(())
    }

    /// Begin generating traffic. Calling twice is an error; a flow whose
    /// endpoints are unreachable fails without side effects.
    pub fn start(&self) -> FlowResult<()> {
        let mut state = self.state.write();
        if *state != FlowState::Created {
            return Err(FlowError::InvalidState {
                operation: "start",
                state: *state,
            });
        }

        for endpoint in [&self.source, &self.destination] {
            if !endpoint.is_available() {
                return Err(FlowError::StartFailed {
                    endpoint: endpoint.name().to_string(),
                });
            }
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let ctx = WorkerContext {
            flow_name: self.name.clone(),
            schedule: self.schedule,
            link: self.link,
            state: Arc::clone(&self.state),
            analysers: Arc::clone(&self.analysers),
            units_sent: Arc::clone(&self.units_sent),
            bytes_sent: Arc::clone(&self.bytes_sent),
        };
        let handle = tokio::spawn(worker::run(ctx, stop_rx));

        *self.stop_tx.lock() = Some(stop_tx);
        *self.worker.lock() = Some(handle);
        *state = FlowState::Running;

        tracing::debug!(flow = %self.name, kind = self.kind.name(), "flow started");
        Ok(())
    }

    /// Request cessation of traffic. Idempotent: a no-op on flows that
    /// already completed naturally or were stopped before.
    pub fn stop(&self) {
        let mut state = self.state.write();
        match *state {
            FlowState::Created | FlowState::Running => {
                *state = FlowState::Stopped;
                if let Some(stop_tx) = self.stop_tx.lock().as_ref() {
                    let _ = stop_tx.send(true);
                }
                tracing::debug!(flow = %self.name, "flow stopped");
            }
            FlowState::NaturallyCompleted | FlowState::Stopped | FlowState::Finalized => {}
        }
    }

    /// Non-blocking completion query. Unbounded flows never report done
    /// until explicitly stopped.
    pub fn is_done(&self) -> bool {
        self.state.read().is_done()
    }

    /// Transition to `Finalized` and run every attached analyser's
    /// `finalize`. Called by the scenario after the stop signal and grace
    /// period; an analyser failure degrades its own entry to unavailable
    /// without affecting the others.
    pub(crate) async fn finalize(&self) -> FlowReport {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            // Worker exits promptly on the stop signal; the await only
            // synchronizes with its last emission.
            let _ = handle.await;
        }

        let completion = {
            let mut state = self.state.write();
            let completion = match *state {
                FlowState::NaturallyCompleted => FlowCompletion::NaturallyCompleted,
                _ => FlowCompletion::StoppedByDeadline,
            };
            *state = FlowState::Finalized;
            completion
        };

        let units_sent = self.units_sent.load(Ordering::Relaxed);
        let ctx = FinalizeContext {
            expected_count: self.schedule.count.unwrap_or(units_sent),
            latency_tagged: self.schedule.latency_tag,
        };

        let mut reports = Vec::new();
        for analyser in self.analysers.lock().iter_mut() {
            let label = analyser.label().to_string();
            let outcome = match analyser.finalize(&ctx) {
                Ok(output) => AnalyserOutcome::Finalized(output),
                Err(error) => AnalyserOutcome::Unavailable {
                    reason: error.to_string(),
                },
            };
            reports.push(AnalyserReport { label, outcome });
        }

        FlowReport {
            name: self.name.clone(),
            kind: self.kind.name(),
            source: self.source.name().to_string(),
            destination: self.destination.name().to_string(),
            completion,
            units_sent,
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            analysers: reports,
        }
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("kind", &self.kind.name())
            .field("source", &self.source.name())
            .field("destination", &self.destination.name())
            .field("state", &self.state())
            .finish()
    }
}
