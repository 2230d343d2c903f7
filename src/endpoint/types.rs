use std::net::IpAddr;
use std::time::Duration;

/// A network test point that can act as source or destination of a flow.
///
/// Implementations are provided by the provisioning layer; the engine only
/// queries identity and availability. Any endpoint can serve either side of
/// any flow.
pub trait Endpoint: Send + Sync {
    /// Human-assigned name, used in reports and diagnostics.
    fn name(&self) -> &str;

    /// Layer 3 address of the test point.
    fn address(&self) -> IpAddr;

    /// Whether the endpoint can currently carry traffic. A flow whose
    /// source or destination reports `false` fails to start.
    fn is_available(&self) -> bool {
        true
    }
}

/// Impairment applied on the path between a flow's source and destination.
///
/// The default profile is a perfect link: nothing is dropped and delivery
/// is instantaneous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkProfile {
    /// Probability in `[0.0, 1.0]` that an emitted unit never arrives.
    pub loss_rate: f64,
    /// Base one-way delay.
    pub latency: Duration,
    /// Maximum random delay added on top of `latency`.
    pub jitter: Duration,
}

impl Default for LinkProfile {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

impl LinkProfile {
    pub fn new(loss_rate: f64, latency: Duration, jitter: Duration) -> Self {
        Self {
            loss_rate: loss_rate.clamp(0.0, 1.0),
            latency,
            jitter,
        }
    }

    /// Lossless link with a fixed one-way delay.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Lossy link with no delay.
    pub fn with_loss(loss_rate: f64) -> Self {
        Self {
            loss_rate: loss_rate.clamp(0.0, 1.0),
            ..Self::default()
        }
    }
}
