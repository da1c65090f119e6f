//! Per-switch forwarding table (learned hardware address locations).

use sdn_types::{MacAddress, PortNo};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Result of recording where an address was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    /// First time this address was seen on the switch.
    Learned,
    /// The address was previously learned on another port.
    Moved { from: PortNo },
    /// Seen again on the port it was already learned on.
    Refreshed,
}

#[derive(Debug, Clone, Copy)]
struct LearnedPort {
    port: PortNo,
    last_seen: Instant,
}

impl LearnedPort {
    fn is_fresh(&self, now: Instant, max_age: Option<Duration>) -> bool {
        match max_age {
            Some(max_age) => now.saturating_duration_since(self.last_seen) <= max_age,
            None => true,
        }
    }
}

/// One learned address, as exposed for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub mac: MacAddress,
    pub port: PortNo,
}

/// Maps each hardware address to the last port a frame from it arrived on.
///
/// At most one entry per address; learning overwrites. Entries never expire
/// unless a caller asks for it via a `max_age`.
#[derive(Debug, Default)]
pub struct ForwardingTable {
    entries: HashMap<MacAddress, LearnedPort>,
}

impl ForwardingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `mac` was seen on `port` at `now`.
    pub fn learn(&mut self, mac: MacAddress, port: PortNo, now: Instant) -> LearnOutcome {
        let learned = LearnedPort {
            port,
            last_seen: now,
        };
        match self.entries.insert(mac, learned) {
            None => LearnOutcome::Learned,
            Some(previous) if previous.port != port => LearnOutcome::Moved {
                from: previous.port,
            },
            Some(_) => LearnOutcome::Refreshed,
        }
    }

    /// Port `mac` was last seen on.
    pub fn lookup(&self, mac: &MacAddress) -> Option<PortNo> {
        self.entries.get(mac).map(|learned| learned.port)
    }

    /// Like [`lookup`](Self::lookup), but entries older than `max_age`
    /// count as absent.
    pub fn lookup_fresh(
        &self,
        mac: &MacAddress,
        now: Instant,
        max_age: Option<Duration>,
    ) -> Option<PortNo> {
        self.entries
            .get(mac)
            .filter(|learned| learned.is_fresh(now, max_age))
            .map(|learned| learned.port)
    }

    /// Removes entries older than `max_age`, returning how many were removed.
    pub fn expire(&mut self, now: Instant, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, learned| learned.is_fresh(now, Some(max_age)));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by address.
    pub fn entries(&self) -> Vec<TableEntry> {
        let mut entries: Vec<TableEntry> = self
            .entries
            .iter()
            .map(|(mac, learned)| TableEntry {
                mac: *mac,
                port: learned.port,
            })
            .collect();
        entries.sort_by_key(|entry| entry.mac);
        entries
    }
}
