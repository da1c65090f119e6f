//! Inbound events delivered by the switch channel.

use sdn_types::{MacAddress, PortNo, SwitchId};
use serde::{Deserialize, Serialize};

/// Opaque reference to frame bytes held in a switch's packet buffer.
///
/// Echoed back on flow installs and packet-outs so the switch can use its own
/// copy of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferId(u32);

impl BufferId {
    pub const fn new(id: u32) -> Self {
        BufferId(id)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// A switch completed its handshake with the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchConnected {
    pub switch_id: SwitchId,
}

/// A frame was sent up to the controller by a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameArrived {
    pub switch_id: SwitchId,
    pub in_port: PortNo,
    pub src: MacAddress,
    pub dst: MacAddress,
    pub payload: Vec<u8>,
    /// `None` when the switch did not buffer the frame.
    pub buffer_id: Option<BufferId>,
}

/// Any event the forwarding engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    Connected(SwitchConnected),
    FrameArrived(FrameArrived),
}

impl SwitchEvent {
    /// The switch this event belongs to.
    pub fn switch_id(&self) -> SwitchId {
        match self {
            SwitchEvent::Connected(ev) => ev.switch_id,
            SwitchEvent::FrameArrived(ev) => ev.switch_id,
        }
    }
}

impl From<SwitchConnected> for SwitchEvent {
    fn from(ev: SwitchConnected) -> Self {
        SwitchEvent::Connected(ev)
    }
}

impl From<FrameArrived> for SwitchEvent {
    fn from(ev: FrameArrived) -> Self {
        SwitchEvent::FrameArrived(ev)
    }
}
