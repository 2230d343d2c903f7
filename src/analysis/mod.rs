//! Flow analysis module.
//!
//! An analyser is bound to exactly one flow and accumulates timestamped
//! samples while the flow runs. Recording must stay cheap (append only);
//! all aggregation is deferred to `finalize`, which runs once behind the
//! scenario's stop/grace barrier and is deterministic over the recorded
//! series.

pub mod error;
pub mod loss_latency;
pub mod throughput;
pub mod types;
pub mod voice;

pub use error::{AnalysisError, AnalysisResult};
pub use loss_latency::LatencyFrameLossAnalyser;
pub use throughput::HttpAnalyser;
pub use types::{
    Analyser, AnalyserOutcome, AnalyserOutput, AnalyserReport, AnalyserSummary, FinalizeContext,
    LatencyStats, SeriesPoint, TrafficSample, Verdict,
};
pub use voice::VoiceAnalyser;
