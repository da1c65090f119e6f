//! Error types for l2switchd.
//!
//! The forwarding core itself has no failure path: unknown switches are
//! created on demand and command delivery is fire-and-forget. Errors only
//! arise at the edges (configuration, input decoding, I/O).

use thiserror::Error;

/// A frame that could not be decoded into a frame-arrived event.
///
/// Such frames are rejected before they reach the forwarding engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameDecodeError {
    /// Frame is shorter than an Ethernet header.
    #[error("truncated frame: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },
}

/// Errors that can occur in l2switchd.
#[derive(Debug, Error)]
pub enum L2SwitchError {
    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file is not valid TOML
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Inbound message is not valid JSON for the expected shape
    #[error("Invalid message: {0}")]
    Json(#[from] serde_json::Error),

    /// Identifier or address could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] sdn_types::ParseError),

    /// Frame could not be decoded
    #[error("Frame decode error: {0}")]
    FrameDecode(#[from] FrameDecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl L2SwitchError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for l2switchd operations
pub type Result<T> = std::result::Result<T, L2SwitchError>;
