//! Ethernet header decoding for raw packet-in payloads.

use crate::error::FrameDecodeError;
use crate::events::{BufferId, FrameArrived};
use sdn_types::{MacAddress, PortNo, SwitchId};

/// Destination, source and EtherType fields of an Ethernet II header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub ether_type: u16,
}

impl EthernetHeader {
    /// Size of the header on the wire.
    pub const LEN: usize = 14;

    /// Parses the header at the start of `frame`.
    pub fn parse(frame: &[u8]) -> Result<Self, FrameDecodeError> {
        let truncated = || FrameDecodeError::Truncated {
            len: frame.len(),
            needed: Self::LEN,
        };

        if frame.len() < Self::LEN {
            return Err(truncated());
        }

        let dst = MacAddress::from_slice(&frame[0..6]).ok_or_else(truncated)?;
        let src = MacAddress::from_slice(&frame[6..12]).ok_or_else(truncated)?;
        let ether_type = u16::from_be_bytes([frame[12], frame[13]]);

        Ok(Self {
            dst,
            src,
            ether_type,
        })
    }
}

impl FrameArrived {
    /// Builds a frame-arrived event from a raw packet-in.
    ///
    /// Frames without a decodable Ethernet header are rejected here so the
    /// forwarding engine only ever sees well-formed events.
    pub fn from_packet_in(
        switch_id: SwitchId,
        in_port: PortNo,
        buffer_id: Option<BufferId>,
        payload: Vec<u8>,
    ) -> Result<Self, FrameDecodeError> {
        let header = EthernetHeader::parse(&payload)?;
        Ok(Self {
            switch_id,
            in_port,
            src: header.src,
            dst: header.dst,
            payload,
            buffer_id,
        })
    }
}
