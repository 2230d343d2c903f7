//! Traffic generation module.
//!
//! A flow is one directional traffic definition between two endpoints.
//! Three variants exist: stream-oriented (HTTP/TCP-like), frame blasting
//! (fixed-rate UDP) and isochronous voice. Each flow owns its attached
//! analysers and, once started, a worker task that emits units on the
//! configured schedule and feeds every emission to the analysers in order.

mod blasting;
pub mod error;
mod flow;
mod stream;
pub mod types;
mod voice;
mod worker;

pub use blasting::FrameBlastingConfig;
pub use error::{FlowError, FlowResult};
pub use flow::{Flow, FlowKind};
pub use stream::StreamConfig;
pub use types::{CompletionPolicy, FlowCompletion, FlowReport, FlowState};
pub use voice::VoiceConfig;
