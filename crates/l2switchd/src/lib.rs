//! Reactive L2 learning switch controller.
//!
//! Switches connect to the controller and send up every frame they have no
//! flow for. The controller learns which port each source address lives
//! behind and, once a destination is known, installs an exact-match flow so
//! the switch forwards the rest of that traffic by itself. Frames to unknown
//! destinations are flooded.
//!
//! # Architecture
//!
//! ```text
//! switch channel ─▶ Dispatcher ─▶ per-switch worker ─▶ ForwardingEngine
//!                                                           │
//!                                      SwitchRegistry ◀─────┤
//!                                                           ▼
//!                                                    SwitchChannel::send
//! ```
//!
//! The engine performs no I/O. Transports plug in behind [`SwitchChannel`];
//! the [`jsonl`] module provides a newline-delimited JSON transport used by
//! the `l2switchd` binary.

pub mod channel;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame;
pub mod jsonl;
pub mod logging;
pub mod registry;
pub mod table;

pub use channel::{MpscChannel, RecordingChannel, SwitchChannel};
pub use commands::{Action, Command, FlowRule, MatchSpec, PacketOut};
pub use config::{ControllerConfig, LogFormat};
pub use dispatcher::Dispatcher;
pub use engine::{EngineStatsSnapshot, ForwardingEngine};
pub use error::{FrameDecodeError, L2SwitchError, Result};
pub use events::{BufferId, FrameArrived, SwitchConnected, SwitchEvent};
pub use registry::SwitchRegistry;
pub use table::{ForwardingTable, LearnOutcome, TableEntry};
