//! Switch (datapath) identifier.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a connected switch, as reported by its control channel.
///
/// The controller never generates or validates these; they are only used as
/// lookup keys for per-switch state.
///
/// # Examples
///
/// ```
/// use sdn_types::SwitchId;
///
/// let id: SwitchId = "0x1".parse().unwrap();
/// assert_eq!(id, SwitchId::new(1));
/// assert_eq!(id.to_string(), "0000000000000001");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(u64);

impl SwitchId {
    /// Creates a switch identifier from a raw datapath id.
    pub const fn new(dpid: u64) -> Self {
        SwitchId(dpid)
    }

    /// Returns the raw datapath id.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for SwitchId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse(),
        };
        parsed
            .map(SwitchId)
            .map_err(|_| ParseError::InvalidSwitchId(s.to_string()))
    }
}

impl From<u64> for SwitchId {
    fn from(dpid: u64) -> Self {
        SwitchId(dpid)
    }
}
