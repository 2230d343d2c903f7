use std::time::Duration;

use crate::flow::error::{FlowError, FlowResult};
use crate::flow::types::EmissionSchedule;

const MIN_FRAME_SIZE: u64 = 64;
const MAX_FRAME_SIZE: u64 = 9000;

/// Configuration for a frame-blasting (fixed-rate UDP) flow.
///
/// Bounded either by `number_of_frames` or by `duration`; with neither set
/// the flow blasts until the scenario stops it. Both set is contradictory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBlastingConfig {
    /// Frames per second.
    pub frame_rate: f64,
    /// Emit exactly this many frames.
    pub number_of_frames: Option<u64>,
    /// Emit for this long.
    pub duration: Option<Duration>,
    /// Frame payload size (64..=9000 bytes).
    pub frame_size: u64,
    /// Embed a send timestamp in each frame so latency can be measured.
    pub latency_tag: bool,
}

impl Default for FrameBlastingConfig {
    fn default() -> Self {
        Self {
            frame_rate: 1000.0,
            number_of_frames: None,
            duration: None,
            frame_size: 1024,
            latency_tag: false,
        }
    }
}

impl FrameBlastingConfig {
    pub(crate) fn validate(&self) -> FlowResult<EmissionSchedule> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(FlowError::Config(format!(
                "frame_rate {} must be positive",
                self.frame_rate
            )));
        }
        if self.number_of_frames.is_some() && self.duration.is_some() {
            return Err(FlowError::Config(
                "number_of_frames and duration are mutually exclusive".into(),
            ));
        }
        if self.number_of_frames == Some(0) {
            return Err(FlowError::Config("number_of_frames must be non-zero".into()));
        }
        if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&self.frame_size) {
            return Err(FlowError::Config(format!(
                "frame_size {} outside {MIN_FRAME_SIZE}..={MAX_FRAME_SIZE}",
                self.frame_size
            )));
        }

        Ok(EmissionSchedule {
            interval: Duration::from_secs_f64(1.0 / self.frame_rate),
            unit_bytes: self.frame_size,
            count: self.number_of_frames,
            duration: self.duration,
            latency_tag: self.latency_tag,
        })
    }
}
