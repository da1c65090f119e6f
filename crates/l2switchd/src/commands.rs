//! Outbound commands issued to a switch through its channel.
//!
//! These are protocol-neutral descriptions; encoding them for a particular
//! switch protocol is the channel's job.

use crate::events::BufferId;
use sdn_types::{MacAddress, PortNo, PortRef};
use serde::Serialize;

/// Which frames a flow rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchSpec {
    /// Matches every frame.
    Wildcard,
    /// Exact match on ingress port and both addresses, no masking.
    Exact {
        in_port: PortNo,
        eth_src: MacAddress,
        eth_dst: MacAddress,
    },
}

/// What a switch does with a matched frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Send the frame to the controller. With `buffered: false` the switch
    /// sends the whole frame instead of a buffer reference.
    SendToController { buffered: bool },
    ForwardTo { port: PortNo },
    Flood,
}

impl Action {
    /// The output action for a resolved port reference.
    ///
    /// Controller output never asks the switch to buffer the frame.
    pub const fn output(port: PortRef) -> Self {
        match port {
            PortRef::Physical(port) => Action::ForwardTo { port },
            PortRef::Flood => Action::Flood,
            PortRef::Controller => Action::SendToController { buffered: false },
        }
    }
}

/// A (match, priority, action) rule to install in the switch's flow table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowRule {
    pub priority: u16,
    pub match_spec: MatchSpec,
    pub action: Action,
    pub buffer_id: Option<BufferId>,
}

/// Explicit transmission of one frame by the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketOut {
    pub buffer_id: Option<BufferId>,
    pub in_port: PortNo,
    pub action: Action,
    pub payload: Vec<u8>,
}

/// A command sent to a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    InstallRule(FlowRule),
    EmitFrame(PacketOut),
}

impl Command {
    /// Returns the flow rule if this is an install command.
    pub fn as_install(&self) -> Option<&FlowRule> {
        match self {
            Command::InstallRule(rule) => Some(rule),
            Command::EmitFrame(_) => None,
        }
    }

    /// Returns the packet-out if this is an emit command.
    pub fn as_emit(&self) -> Option<&PacketOut> {
        match self {
            Command::EmitFrame(packet) => Some(packet),
            Command::InstallRule(_) => None,
        }
    }
}
