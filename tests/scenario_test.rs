//! End-to-end scenario tests: timing policy across heterogeneous flow
//! types, atomic start failure, loss accounting over an impaired link and
//! report generation. Timings are scaled down to milliseconds with
//! generous tolerances so the suite stays fast and robust.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use flowbench::analysis::{
    Analyser, AnalysisError, AnalysisResult, AnalyserOutput, AnalyserSummary, FinalizeContext,
    HttpAnalyser, LatencyFrameLossAnalyser, TrafficSample, VoiceAnalyser,
};
use flowbench::endpoint::{Endpoint, LinkProfile, Port};
use flowbench::flow::{
    Flow, FlowCompletion, FlowState, FrameBlastingConfig, StreamConfig, VoiceConfig,
};
use flowbench::report::{JUnitReport, JsonReport, ReportSink, TextReport};
use flowbench::scenario::{Scenario, ScenarioConfig, ScenarioError, ScenarioPhase};

const GRACE: Duration = Duration::from_millis(100);
/// Scheduling slack for loaded CI machines.
const TOLERANCE: Duration = Duration::from_millis(500);

fn port(name: &str) -> Arc<dyn Endpoint> {
    Arc::new(Port::new(name, IpAddr::from([10, 0, 0, 1])))
}

fn fast_scenario() -> Scenario {
    Scenario::new().with_config(ScenarioConfig {
        grace_period: GRACE,
        poll_interval: Duration::from_millis(10),
    })
}

fn duration_flow(name: &str, duration: Duration) -> Flow {
    Flow::frame_blasting(
        port("src"),
        port("dst"),
        name,
        FrameBlastingConfig {
            frame_rate: 200.0,
            duration: Some(duration),
            ..FrameBlastingConfig::default()
        },
    )
    .unwrap()
}

fn counted_flow(name: &str, frames: u64, rate: f64) -> Flow {
    Flow::frame_blasting(
        port("src"),
        port("dst"),
        name,
        FrameBlastingConfig {
            frame_rate: rate,
            number_of_frames: Some(frames),
            latency_tag: true,
            ..FrameBlastingConfig::default()
        },
    )
    .unwrap()
}

fn unbounded_voice(name: &str) -> Flow {
    Flow::voice(port("src"), port("dst"), name, VoiceConfig::default()).unwrap()
}

#[tokio::test]
async fn fixed_duration_flow_bounds_the_run() {
    let duration = Duration::from_millis(300);
    let mut scenario = fast_scenario();
    scenario.add_flow(duration_flow("solo", duration)).unwrap();

    let started = Instant::now();
    scenario.run(None).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= duration, "run returned before {duration:?}");
    assert!(
        elapsed <= duration + GRACE + TOLERANCE,
        "run took {elapsed:?}, expected at most {:?}",
        duration + GRACE + TOLERANCE
    );

    let snapshot = scenario.snapshot().unwrap();
    assert_eq!(snapshot.flows.len(), 1);
    assert_eq!(
        snapshot.flows[0].completion,
        FlowCompletion::NaturallyCompleted
    );
}

#[tokio::test]
async fn slow_rate_duration_flow_completes_naturally() {
    // 2 fps with a 100 ms duration: the flow's expiry falls between
    // emission ticks, yet the snapshot must record natural completion, not
    // a deadline stop.
    let flow = Flow::frame_blasting(
        port("src"),
        port("dst"),
        "slow",
        FrameBlastingConfig {
            frame_rate: 2.0,
            duration: Some(Duration::from_millis(100)),
            ..FrameBlastingConfig::default()
        },
    )
    .unwrap();

    let mut scenario = fast_scenario();
    scenario.add_flow(flow).unwrap();
    scenario.run(None).await.unwrap();

    let snapshot = scenario.snapshot().unwrap();
    assert_eq!(
        snapshot.flows[0].completion,
        FlowCompletion::NaturallyCompleted
    );
}

#[tokio::test]
async fn fixed_count_flow_completes_independently() {
    // 50 frames at 1 kfps finish after ~50 ms while the voice call keeps
    // running until the explicit deadline.
    let mut scenario = fast_scenario();
    scenario.add_flow(counted_flow("counted", 50, 1000.0)).unwrap();
    scenario.add_flow(unbounded_voice("call")).unwrap();

    scenario.run(Some(Duration::from_millis(400))).await.unwrap();

    let snapshot = scenario.snapshot().unwrap();
    let counted = &snapshot.flows[0];
    let call = &snapshot.flows[1];

    assert_eq!(counted.completion, FlowCompletion::NaturallyCompleted);
    assert_eq!(counted.units_sent, 50);
    assert_eq!(call.completion, FlowCompletion::StoppedByDeadline);
    assert!(call.units_sent > 0);
}

#[tokio::test]
async fn explicit_duration_outlives_natural_completion() {
    // A completes naturally at 200 ms; the explicit 500 ms deadline keeps
    // the unbounded flow running until then.
    let natural = Duration::from_millis(200);
    let overall = Duration::from_millis(500);

    let mut scenario = fast_scenario();
    scenario.add_flow(duration_flow("a", natural)).unwrap();
    scenario.add_flow(unbounded_voice("b")).unwrap();

    scenario.run(Some(overall)).await.unwrap();

    let snapshot = scenario.snapshot().unwrap();
    assert!(snapshot.traffic_elapsed >= overall);
    assert!(snapshot.traffic_elapsed <= overall + TOLERANCE);
    assert_eq!(
        snapshot.flows[0].completion,
        FlowCompletion::NaturallyCompleted
    );
    assert_eq!(
        snapshot.flows[1].completion,
        FlowCompletion::StoppedByDeadline
    );
}

#[tokio::test]
async fn lossless_link_passes_loss_analyser() {
    let flow = counted_flow("clean", 100, 2000.0);
    flow.attach_analyser(Box::new(LatencyFrameLossAnalyser::new()))
        .unwrap();

    let mut scenario = fast_scenario();
    scenario.add_flow(flow).unwrap();
    scenario.run(None).await.unwrap();

    let snapshot = scenario.snapshot().unwrap();
    let report = &snapshot.flows[0].analysers[0];
    match report.verdict() {
        Some(verdict) => assert!(verdict.is_pass(), "clean run must pass: {verdict:?}"),
        None => panic!("analyser unexpectedly unavailable"),
    }
}

#[tokio::test]
async fn full_loss_link_fails_loss_analyser() {
    let flow =
        counted_flow("blackhole", 100, 2000.0).with_link(LinkProfile::with_loss(1.0));
    flow.attach_analyser(Box::new(LatencyFrameLossAnalyser::new()))
        .unwrap();

    let mut scenario = fast_scenario();
    scenario.add_flow(flow).unwrap();
    scenario.run(None).await.unwrap();

    let snapshot = scenario.snapshot().unwrap();
    let outcome = &snapshot.flows[0].analysers[0];
    assert!(outcome.is_available());
    assert!(!outcome.verdict().unwrap().is_pass());
}

#[tokio::test]
async fn start_failure_aborts_atomically() {
    let down: Arc<dyn Endpoint> =
        Arc::new(Port::unavailable("dead-port", IpAddr::from([10, 0, 0, 9])));
    let doomed = Flow::frame_blasting(
        port("src"),
        down,
        "doomed",
        FrameBlastingConfig::default(),
    )
    .unwrap();

    let mut scenario = fast_scenario();
    scenario.add_flow(unbounded_voice("one")).unwrap();
    scenario.add_flow(unbounded_voice("two")).unwrap();
    scenario.add_flow(doomed).unwrap();

    match scenario.run(Some(Duration::from_secs(5))).await {
        Err(ScenarioError::FlowStart { flow, .. }) => assert_eq!(flow, "doomed"),
        other => panic!("expected FlowStart error, got {other:?}"),
    }

    assert_eq!(scenario.phase(), ScenarioPhase::Aborted);
    for flow in &scenario.flows()[..2] {
        assert_eq!(
            flow.state(),
            FlowState::Finalized,
            "started flow '{}' must be finalized by the abort",
            flow.name()
        );
    }
    assert!(scenario.snapshot().is_none(), "partial results must be discarded");
    assert!(scenario.report().is_err());
}

#[tokio::test]
async fn only_unbounded_flows_require_explicit_duration() {
    let mut scenario = fast_scenario();
    scenario.add_flow(unbounded_voice("background")).unwrap();

    match scenario.run(None).await {
        Err(ScenarioError::Configuration(_)) => {}
        other => panic!("expected Configuration error, got {other:?}"),
    }
    assert_eq!(scenario.flows()[0].units_sent(), 0, "no traffic may start");
}

#[tokio::test]
async fn contradictory_stream_config_fails_at_construction() {
    let result = Flow::stream(
        port("src"),
        port("dst"),
        "contradictory",
        StreamConfig {
            request_duration: Some(Duration::from_secs(10)),
            request_size: Some(1_000_000),
            ..StreamConfig::default()
        },
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn report_twice_produces_identical_output() {
    let dir = TempDir::new().unwrap();
    let flow = counted_flow("reported", 20, 1000.0);
    flow.attach_analyser(Box::new(LatencyFrameLossAnalyser::new()))
        .unwrap();

    let mut scenario = fast_scenario();
    scenario.add_flow(flow).unwrap();
    scenario
        .add_report(Box::new(TextReport::new(dir.path())))
        .unwrap();
    scenario
        .add_report(Box::new(JsonReport::new(dir.path())))
        .unwrap();
    scenario
        .add_report(Box::new(JUnitReport::new(dir.path())))
        .unwrap();

    scenario.run(None).await.unwrap();

    let first = scenario.report().unwrap();
    let contents_first: Vec<String> = first
        .iter()
        .map(|p| std::fs::read_to_string(p).unwrap())
        .collect();

    let second = scenario.report().unwrap();
    let contents_second: Vec<String> = second
        .iter()
        .map(|p| std::fs::read_to_string(p).unwrap())
        .collect();

    assert_eq!(first, second);
    assert_eq!(contents_first, contents_second);
}

/// Analyser whose finalization always fails, for isolation testing.
struct BrokenAnalyser;

impl Analyser for BrokenAnalyser {
    fn label(&self) -> &str {
        "broken"
    }

    fn on_sample(&mut self, _sample: &TrafficSample) {}

    fn finalize(&mut self, _ctx: &FinalizeContext) -> AnalysisResult<AnalyserOutput> {
        Err(AnalysisError::InconsistentSeries("injected failure".into()))
    }
}

#[tokio::test]
async fn analyser_failure_is_isolated() {
    let flow = counted_flow("partial", 50, 1000.0);
    flow.attach_analyser(Box::new(BrokenAnalyser)).unwrap();
    flow.attach_analyser(Box::new(LatencyFrameLossAnalyser::new()))
        .unwrap();

    let mut scenario = fast_scenario();
    scenario.add_flow(flow).unwrap();
    scenario.run(None).await.unwrap();

    let snapshot = scenario.snapshot().unwrap();
    let analysers = &snapshot.flows[0].analysers;
    assert_eq!(analysers.len(), 2);
    assert!(!analysers[0].is_available(), "broken analyser marked unavailable");
    assert!(analysers[1].is_available(), "healthy analyser unaffected");
    assert_eq!(snapshot.unavailable_count(), 1);
}

#[tokio::test]
async fn voice_scenario_end_to_end() {
    let dir = TempDir::new().unwrap();

    // Downstream voice call over a lightly impaired link plus background
    // HTTP traffic, the shape of a realistic triple-play test.
    let link = LinkProfile::new(0.0, Duration::from_millis(15), Duration::from_millis(5));
    let voice = Flow::voice(
        port("wan"),
        port("cpe"),
        "Downstream Voice flow",
        VoiceConfig::default(),
    )
    .unwrap()
    .with_link(link);
    voice
        .attach_analyser(Box::new(VoiceAnalyser::new().with_min_mos(3.5)))
        .unwrap();

    let background = Flow::stream(
        port("wan"),
        port("cpe"),
        "Background TCP flow",
        StreamConfig {
            request_duration: Some(Duration::from_millis(300)),
            rate_limit_bps: 1_000_000,
            segment_size: 500,
            ..StreamConfig::default()
        },
    )
    .unwrap();
    background
        .attach_analyser(Box::new(HttpAnalyser::new()))
        .unwrap();

    let mut scenario = fast_scenario();
    scenario.add_flow(voice).unwrap();
    scenario.add_flow(background).unwrap();
    scenario
        .add_report(Box::new(JUnitReport::new(dir.path())))
        .unwrap();

    scenario.run(Some(Duration::from_millis(400))).await.unwrap();
    let outputs = scenario.report().unwrap();

    let snapshot = scenario.snapshot().unwrap();
    let voice_report = &snapshot.flows[0].analysers[0];
    match voice_report.verdict() {
        Some(verdict) => assert!(verdict.is_pass(), "clean call must pass: {verdict:?}"),
        None => panic!("voice analyser unavailable"),
    }
    if let flowbench::analysis::AnalyserOutcome::Finalized(output) = &voice_report.outcome {
        match &output.summary {
            AnalyserSummary::Voice { mos, .. } => assert!(mos.unwrap() > 3.5),
            other => panic!("unexpected summary: {other:?}"),
        }
    }

    let junit = std::fs::read_to_string(&outputs[0]).unwrap();
    assert!(junit.contains(r#"failures="0""#));
    assert!(junit.contains("Downstream Voice flow - Voice quality"));

    // The sink trait promises a stable label for each format.
    assert_eq!(JUnitReport::new(dir.path()).label(), "junit");
}
