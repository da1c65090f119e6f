//! Switch port numbers and output port references.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A concrete port on a switch.
///
/// Switches reserve the top of the 32-bit port space for logical ports
/// (flood, controller, ...). Those values are expressed through [`PortRef`]
/// and can never be held by a `PortNo`. The one exception is
/// [`PortNo::LOCAL`], the switch's own network interface, which frames can
/// arrive on and be forwarded to like any other port.
///
/// # Examples
///
/// ```
/// use sdn_types::PortNo;
///
/// let port = PortNo::new(3).unwrap();
/// assert_eq!(port.as_u32(), 3);
///
/// assert!(PortNo::new(0xffff_fffb).is_err());
/// assert_eq!(PortNo::new(0xffff_fffe), Ok(PortNo::LOCAL));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PortNo(u32);

impl PortNo {
    /// First port number of the switch-reserved range.
    pub const RESERVED_MIN: u32 = 0xffff_ff00;

    /// The switch's local interface.
    pub const LOCAL: PortNo = PortNo(0xffff_fffe);

    /// Creates a new port number.
    ///
    /// # Errors
    ///
    /// Returns an error if `port` falls in the reserved range and is not
    /// [`PortNo::LOCAL`].
    pub const fn new(port: u32) -> Result<Self, ParseError> {
        if port < Self::RESERVED_MIN || port == Self::LOCAL.0 {
            Ok(PortNo(port))
        } else {
            Err(ParseError::ReservedPortNumber(port))
        }
    }

    /// Returns the port number as a u32.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for PortNo {
    type Error = ParseError;

    fn try_from(port: u32) -> Result<Self, Self::Error> {
        PortNo::new(port)
    }
}

impl From<PortNo> for u32 {
    fn from(port: PortNo) -> u32 {
        port.0
    }
}

/// Where a frame should go: a concrete port or a reserved logical port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PortRef {
    /// A concrete port on the switch.
    Physical(PortNo),
    /// Every port except the ingress port.
    Flood,
    /// The control channel to this controller.
    Controller,
}

impl PortRef {
    /// Returns the concrete port, if this is not a reserved port.
    pub const fn physical(&self) -> Option<PortNo> {
        match self {
            PortRef::Physical(port) => Some(*port),
            PortRef::Flood | PortRef::Controller => None,
        }
    }

    /// Returns true if this is the flood sentinel.
    pub const fn is_flood(&self) -> bool {
        matches!(self, PortRef::Flood)
    }
}

impl From<PortNo> for PortRef {
    fn from(port: PortNo) -> Self {
        PortRef::Physical(port)
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRef::Physical(port) => write!(f, "{}", port),
            PortRef::Flood => write!(f, "flood"),
            PortRef::Controller => write!(f, "controller"),
        }
    }
}

impl FromStr for PortRef {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flood" => Ok(PortRef::Flood),
            "controller" => Ok(PortRef::Controller),
            other => {
                let port: u32 = other
                    .parse()
                    .map_err(|_| ParseError::InvalidPortRef(s.to_string()))?;
                Ok(PortRef::Physical(PortNo::new(port)?))
            }
        }
    }
}

impl TryFrom<String> for PortRef {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PortRef> for String {
    fn from(port: PortRef) -> String {
        port.to_string()
    }
}
