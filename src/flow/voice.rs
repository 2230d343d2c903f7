use std::time::Duration;

use crate::flow::error::{FlowError, FlowResult};
use crate::flow::types::EmissionSchedule;

/// G.711 packetization: 50 packets/s, 160 payload bytes per packet.
pub const G711_PACKET_INTERVAL: Duration = Duration::from_millis(20);
pub const G711_PAYLOAD_BYTES: u64 = 160;

/// Configuration for an isochronous (constant-bitrate voice) flow.
///
/// Codec parameters are fixed at G.711; the only tunables are how long the
/// call runs (`None` means until the scenario stops it, like a call left
/// up for the whole test) and whether packets carry a latency tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceConfig {
    pub duration: Option<Duration>,
    pub enable_latency: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            duration: None,
            enable_latency: true,
        }
    }
}

impl VoiceConfig {
    pub(crate) fn validate(&self) -> FlowResult<EmissionSchedule> {
        if let Some(duration) = self.duration {
            if duration.is_zero() {
                return Err(FlowError::Config("voice duration must be non-zero".into()));
            }
        }

        Ok(EmissionSchedule {
            interval: G711_PACKET_INTERVAL,
            unit_bytes: G711_PAYLOAD_BYTES,
            count: None,
            duration: self.duration,
            latency_tag: self.enable_latency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::types::CompletionPolicy;

    #[test]
    fn default_voice_flow_is_unbounded() {
        let schedule = VoiceConfig::default().validate().unwrap();
        assert_eq!(schedule.policy(), CompletionPolicy::Unbounded);
        assert_eq!(schedule.interval, Duration::from_millis(20));
        assert_eq!(schedule.unit_bytes, 160);
        assert!(schedule.latency_tag);
    }

    #[test]
    fn zero_duration_rejected() {
        let config = VoiceConfig {
            duration: Some(Duration::ZERO),
            ..VoiceConfig::default()
        };
        assert!(matches!(config.validate(), Err(FlowError::Config(_))));
    }
}
