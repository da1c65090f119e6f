//! The switch channel seam.
//!
//! A [`SwitchChannel`] accepts already-constructed commands for a switch.
//! Sending is fire-and-forget: the engine never observes delivery failures,
//! those belong to whatever sits behind the channel.

use crate::commands::Command;
use parking_lot::Mutex;
use sdn_types::SwitchId;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::warn;

/// Outbound half of a switch control channel.
#[cfg_attr(test, mockall::automock)]
pub trait SwitchChannel: Send + Sync {
    /// Queues `command` for delivery to `switch_id`.
    fn send(&self, switch_id: SwitchId, command: Command);
}

/// Channel that keeps every command in memory, in send order.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(SwitchId, Command)>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands sent so far.
    pub fn commands(&self) -> Vec<(SwitchId, Command)> {
        self.sent.lock().clone()
    }

    /// Commands sent to one switch, in send order.
    pub fn commands_for(&self, switch_id: SwitchId) -> Vec<Command> {
        self.sent
            .lock()
            .iter()
            .filter(|(id, _)| *id == switch_id)
            .map(|(_, command)| command.clone())
            .collect()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<(SwitchId, Command)> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

impl SwitchChannel for RecordingChannel {
    fn send(&self, switch_id: SwitchId, command: Command) {
        self.sent.lock().push((switch_id, command));
    }
}

/// Channel that hands commands to an async consumer over an unbounded queue.
#[derive(Debug)]
pub struct MpscChannel {
    tx: mpsc::UnboundedSender<(SwitchId, Command)>,
    dropped: AtomicU64,
}

impl MpscChannel {
    /// Creates the channel and the receiver its commands arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(SwitchId, Command)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Number of commands discarded because the receiver was gone.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl SwitchChannel for MpscChannel {
    fn send(&self, switch_id: SwitchId, command: Command) {
        if self.tx.send((switch_id, command)).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(switch = %switch_id, "Command receiver closed, dropping command");
        }
    }
}
