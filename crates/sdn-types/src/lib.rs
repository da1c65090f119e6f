//! Common types for the SDN learning switch controller.
//!
//! This crate provides type-safe representations of the primitives that
//! flow between a switch channel and the forwarding logic:
//!
//! - [`MacAddress`]: 48-bit Ethernet hardware addresses
//! - [`PortNo`]: a concrete switch port number
//! - [`PortRef`]: a concrete port or one of the reserved FLOOD/CONTROLLER ports
//! - [`SwitchId`]: the datapath identifier of a connected switch

mod mac;
mod port;
mod switch;

pub use mac::MacAddress;
pub use port::{PortNo, PortRef};
pub use switch::SwitchId;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid port number: {0} (reserved range starts at 0xffffff00)")]
    ReservedPortNumber(u32),

    #[error("invalid port reference: {0}")]
    InvalidPortRef(String),

    #[error("invalid switch identifier: {0}")]
    InvalidSwitchId(String),
}
