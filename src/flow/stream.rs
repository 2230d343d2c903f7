use std::time::Duration;

use crate::flow::error::{FlowError, FlowResult};
use crate::flow::types::EmissionSchedule;

const MAX_WINDOW_SCALING: u8 = 14;

/// Configuration for a stream-oriented (HTTP/TCP-like) flow.
///
/// Exactly one of `request_duration` and `request_size` may be set; both
/// set is contradictory and neither set means the stream runs until the
/// scenario stops it. Validation happens at flow construction, never at
/// run time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    /// Keep requesting data for this long.
    pub request_duration: Option<Duration>,
    /// Request exactly this many payload bytes.
    pub request_size: Option<u64>,
    /// Rate limit in bits per second.
    pub rate_limit_bps: u64,
    /// TCP receive window scaling factor (0..=14).
    pub receive_window_scaling: Option<u8>,
    /// Payload bytes per segment.
    pub segment_size: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            request_duration: None,
            request_size: None,
            rate_limit_bps: 4_000_000,
            receive_window_scaling: None,
            segment_size: 1460,
        }
    }
}

impl StreamConfig {
    pub(crate) fn validate(&self) -> FlowResult<EmissionSchedule> {
        if self.request_duration.is_some() && self.request_size.is_some() {
            return Err(FlowError::Config(
                "request_duration and request_size are mutually exclusive".into(),
            ));
        }
        if let Some(duration) = self.request_duration {
            if duration.is_zero() {
                return Err(FlowError::Config("request_duration must be non-zero".into()));
            }
        }
        if self.request_size == Some(0) {
            return Err(FlowError::Config("request_size must be non-zero".into()));
        }
        if self.rate_limit_bps == 0 {
            return Err(FlowError::Config("rate_limit must be non-zero".into()));
        }
        if self.segment_size == 0 || self.segment_size > 65_535 {
            return Err(FlowError::Config(format!(
                "segment_size {} outside 1..=65535",
                self.segment_size
            )));
        }
        if let Some(scaling) = self.receive_window_scaling {
            if scaling > MAX_WINDOW_SCALING {
                return Err(FlowError::Config(format!(
                    "receive_window_scaling {scaling} exceeds maximum {MAX_WINDOW_SCALING}"
                )));
            }
        }

        let interval =
            Duration::from_secs_f64(self.segment_size as f64 * 8.0 / self.rate_limit_bps as f64);
        let count = self
            .request_size
            .map(|size| size.div_ceil(self.segment_size));

        Ok(EmissionSchedule {
            interval,
            unit_bytes: self.segment_size,
            count,
            duration: self.request_duration,
            latency_tag: false,
        })
    }
}
