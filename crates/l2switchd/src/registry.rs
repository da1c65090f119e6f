//! SwitchRegistry - per-switch forwarding tables.
//!
//! The top-level map is only written when a switch is first seen, so it sits
//! behind a read-write lock. Each table has its own mutex: events for
//! different switches never contend, and a single switch has a single writer
//! as long as its events are processed in order.

use crate::table::{ForwardingTable, LearnOutcome, TableEntry};
use parking_lot::{Mutex, MutexGuard, RwLock};
use sdn_types::{MacAddress, PortNo, SwitchId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared handle to one switch's forwarding table.
#[derive(Debug, Clone, Default)]
pub struct TableHandle(Arc<Mutex<ForwardingTable>>);

impl TableHandle {
    /// Locks the table for reading or updating.
    pub fn lock(&self) -> MutexGuard<'_, ForwardingTable> {
        self.0.lock()
    }
}

/// Owns the forwarding table of every switch seen by the controller.
#[derive(Debug, Default)]
pub struct SwitchRegistry {
    tables: RwLock<HashMap<SwitchId, TableHandle>>,
    /// Entries older than this are ignored by lookups. `None` disables aging.
    aging: Option<Duration>,
}

impl SwitchRegistry {
    /// Creates a registry that never ages out learned entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose lookups ignore entries older than `aging`.
    pub fn with_aging(aging: Option<Duration>) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            aging,
        }
    }

    pub fn aging(&self) -> Option<Duration> {
        self.aging
    }

    /// Returns the table for `switch_id`, creating an empty one if absent.
    pub fn ensure_table(&self, switch_id: SwitchId) -> TableHandle {
        if let Some(table) = self.tables.read().get(&switch_id) {
            return table.clone();
        }

        self.tables
            .write()
            .entry(switch_id)
            .or_insert_with(|| {
                debug!(switch = %switch_id, "Created forwarding table");
                TableHandle::default()
            })
            .clone()
    }

    /// Records `mac` as reachable through `port` on `switch_id`.
    pub fn learn(&self, switch_id: SwitchId, mac: MacAddress, port: PortNo) -> LearnOutcome {
        self.ensure_table(switch_id)
            .lock()
            .learn(mac, port, Instant::now())
    }

    /// Port `mac` was last seen on at `switch_id`, if known.
    ///
    /// Never creates a table.
    pub fn lookup(&self, switch_id: SwitchId, mac: &MacAddress) -> Option<PortNo> {
        self.lookup_at(switch_id, mac, Instant::now())
    }

    /// Lookup evaluated at a given instant (aging is relative to `now`).
    pub fn lookup_at(&self, switch_id: SwitchId, mac: &MacAddress, now: Instant) -> Option<PortNo> {
        let table = self.tables.read().get(&switch_id)?.clone();
        let port = table.lock().lookup_fresh(mac, now, self.aging);
        port
    }

    /// Removes aged-out entries from every table.
    ///
    /// Returns the number of entries removed; always 0 when aging is disabled.
    pub fn expire_stale(&self, now: Instant) -> usize {
        let Some(aging) = self.aging else {
            return 0;
        };

        let tables: Vec<TableHandle> = self.tables.read().values().cloned().collect();
        tables
            .iter()
            .map(|table| table.lock().expire(now, aging))
            .sum()
    }

    /// Number of switches with a table.
    pub fn switch_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Known switches, sorted.
    pub fn switches(&self) -> Vec<SwitchId> {
        let mut switches: Vec<SwitchId> = self.tables.read().keys().copied().collect();
        switches.sort();
        switches
    }

    /// Number of learned entries for `switch_id`, if the switch is known.
    pub fn table_len(&self, switch_id: SwitchId) -> Option<usize> {
        let table = self.tables.read().get(&switch_id)?.clone();
        let len = table.lock().len();
        Some(len)
    }

    /// Copy of the learned entries for `switch_id`.
    pub fn snapshot(&self, switch_id: SwitchId) -> Vec<TableEntry> {
        match self.tables.read().get(&switch_id) {
            Some(table) => table.lock().entries(),
            None => Vec::new(),
        }
    }
}
