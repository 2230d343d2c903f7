use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::endpoint::Endpoint;

/// Concrete port handle backed by the provisioning layer.
///
/// The address is assumed to be fully configured (static, DHCP or NAT
/// resolution already done) by the time the handle is constructed.
pub struct Port {
    name: String,
    address: IpAddr,
    available: AtomicBool,
}

impl Port {
    pub fn new(name: impl Into<String>, address: IpAddr) -> Self {
        Self {
            name: name.into(),
            address,
            available: AtomicBool::new(true),
        }
    }

    /// A port that refuses traffic, e.g. an interface that went down after
    /// provisioning. Flows referencing it fail to start.
    pub fn unavailable(name: impl Into<String>, address: IpAddr) -> Self {
        Self {
            name: name.into(),
            address,
            available: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Endpoint for Port {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> IpAddr {
        self.address
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("available", &self.is_available())
            .finish()
    }
}
