//! flowbench: a scenario engine for orchestrated network traffic tests.
//!
//! The engine runs multiple concurrent traffic flows between test
//! endpoints, attaches metric analysers to each flow, reconciles
//! heterogeneous completion policies (fixed duration, fixed count,
//! unbounded background traffic) into one deterministic stop condition,
//! and renders correlated reports in text, JSON and JUnit XML formats.
//!
//! A typical test builds ports, defines flows between them, attaches
//! analysers, registers everything on a [`scenario::Scenario`] and then
//! calls `run` followed by `report`:
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use flowbench::analysis::LatencyFrameLossAnalyser;
//! use flowbench::endpoint::{Endpoint, Port};
//! use flowbench::flow::{Flow, FrameBlastingConfig};
//! use flowbench::report::{JsonReport, TextReport};
//! use flowbench::scenario::Scenario;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let wan: Arc<dyn Endpoint> = Arc::new(Port::new("WAN", "10.8.128.61".parse()?));
//! let cpe: Arc<dyn Endpoint> = Arc::new(Port::new("CPE", "10.8.128.62".parse()?));
//!
//! let flow = Flow::frame_blasting(
//!     Arc::clone(&wan),
//!     Arc::clone(&cpe),
//!     "Downstream UDP flow",
//!     FrameBlastingConfig {
//!         frame_rate: 1000.0,
//!         number_of_frames: Some(10_000),
//!         latency_tag: true,
//!         ..FrameBlastingConfig::default()
//!     },
//! )?;
//! flow.attach_analyser(Box::new(LatencyFrameLossAnalyser::new()))?;
//!
//! let mut scenario = Scenario::new();
//! scenario.add_flow(flow)?;
//! scenario.add_report(Box::new(TextReport::new("reports")))?;
//! scenario.add_report(Box::new(JsonReport::new("reports")))?;
//!
//! scenario.run(Some(Duration::from_secs(12))).await?;
//! scenario.report()?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod endpoint;
pub mod flow;
pub mod report;
pub mod scenario;
