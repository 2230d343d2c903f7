//! Traffic endpoint interfaces.
//!
//! Ports are the engine's boundary to the provisioning layer. The scenario
//! core only needs identity and availability from an endpoint; addressing,
//! DHCP/NAT resolution and interface setup all happen before a port handle
//! reaches a flow. `LinkProfile` describes the impairment applied on the
//! path between two ports.

mod port;
mod types;

pub use port::Port;
pub use types::{Endpoint, LinkProfile};
