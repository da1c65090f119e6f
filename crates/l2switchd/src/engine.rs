//! ForwardingEngine - reactive L2 learning and flow installation.
//!
//! The engine reacts to two events:
//!
//! - a switch connecting, answered with a catch-all table-miss rule that
//!   sends every unmatched frame to the controller;
//! - a frame arriving, which teaches the engine where its source lives and
//!   is then forwarded to the learned port of its destination (installing an
//!   exact-match flow first) or flooded when the destination is unknown.
//!
//! All state lives in the owned [`SwitchRegistry`]; the engine performs no
//! I/O and only hands commands to the [`SwitchChannel`] it is given.

use crate::channel::SwitchChannel;
use crate::commands::{Action, Command, FlowRule, MatchSpec, PacketOut};
use crate::config::{ControllerConfig, FlowConfig};
use crate::events::{FrameArrived, SwitchEvent};
use crate::registry::SwitchRegistry;
use crate::table::LearnOutcome;
use sdn_types::{PortRef, SwitchId};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Counters kept by the engine.
#[derive(Debug, Default)]
pub struct EngineStats {
    switches_connected: AtomicU64,
    frames_processed: AtomicU64,
    floods: AtomicU64,
    flows_installed: AtomicU64,
    packets_emitted: AtomicU64,
    station_moves: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatsSnapshot {
    pub switches_connected: u64,
    pub frames_processed: u64,
    pub floods: u64,
    pub flows_installed: u64,
    pub packets_emitted: u64,
    pub station_moves: u64,
}

impl EngineStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            switches_connected: self.switches_connected.load(Ordering::Relaxed),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            floods: self.floods.load(Ordering::Relaxed),
            flows_installed: self.flows_installed.load(Ordering::Relaxed),
            packets_emitted: self.packets_emitted.load(Ordering::Relaxed),
            station_moves: self.station_moves.load(Ordering::Relaxed),
        }
    }
}

/// Learning switch decision logic for any number of switches.
#[derive(Debug, Default)]
pub struct ForwardingEngine {
    registry: SwitchRegistry,
    flows: FlowConfig,
    stats: EngineStats,
}

impl ForwardingEngine {
    /// Creates an engine with default rule priorities around `registry`.
    pub fn new(registry: SwitchRegistry) -> Self {
        Self {
            registry,
            flows: FlowConfig::default(),
            stats: EngineStats::default(),
        }
    }

    /// Creates an engine from controller configuration.
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            registry: SwitchRegistry::with_aging(config.aging_time()),
            flows: config.flows.clone(),
            stats: EngineStats::default(),
        }
    }

    pub fn registry(&self) -> &SwitchRegistry {
        &self.registry
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Routes an event to the matching entry point.
    pub fn handle(&self, event: SwitchEvent, channel: &dyn SwitchChannel) {
        match event {
            SwitchEvent::Connected(ev) => self.on_switch_connected(ev.switch_id, channel),
            SwitchEvent::FrameArrived(ev) => self.on_frame_arrived(ev, channel),
        }
    }

    /// Installs the table-miss rule on a newly connected switch.
    ///
    /// Every connection gets its own install; reconnects are not deduplicated.
    #[instrument(skip_all, fields(switch = %switch_id))]
    pub fn on_switch_connected(&self, switch_id: SwitchId, channel: &dyn SwitchChannel) {
        self.registry.ensure_table(switch_id);

        let rule = FlowRule {
            priority: self.flows.table_miss_priority,
            match_spec: MatchSpec::Wildcard,
            action: Action::output(PortRef::Controller),
            buffer_id: None,
        };
        channel.send(switch_id, Command::InstallRule(rule));

        EngineStats::bump(&self.stats.switches_connected);
        info!(
            priority = self.flows.table_miss_priority,
            "Switch connected, installed table-miss rule"
        );
    }

    /// Learns the frame's source, then forwards or floods it.
    ///
    /// When the destination is known an exact-match flow is installed before
    /// the frame itself is sent, so later frames of the flow stay on the
    /// switch. The current frame is always sent explicitly.
    #[instrument(
        skip_all,
        fields(switch = %event.switch_id, in_port = %event.in_port, src = %event.src, dst = %event.dst)
    )]
    pub fn on_frame_arrived(&self, event: FrameArrived, channel: &dyn SwitchChannel) {
        self.on_frame_arrived_at(event, Instant::now(), channel);
    }

    /// [`on_frame_arrived`](Self::on_frame_arrived) with aging evaluated at `now`.
    pub(crate) fn on_frame_arrived_at(
        &self,
        event: FrameArrived,
        now: Instant,
        channel: &dyn SwitchChannel,
    ) {
        let table = self.registry.ensure_table(event.switch_id);

        // Learn and decide under one lock so the decision sees this frame.
        let (outcome, out_port) = {
            let mut table = table.lock();
            let outcome = table.learn(event.src, event.in_port, now);
            let out_port = table
                .lookup_fresh(&event.dst, now, self.registry.aging())
                .map_or(PortRef::Flood, PortRef::Physical);
            (outcome, out_port)
        };

        if let LearnOutcome::Moved { from } = outcome {
            EngineStats::bump(&self.stats.station_moves);
            debug!(%from, to = %event.in_port, "Station moved");
        }

        let action = Action::output(out_port);

        if let Some(port) = out_port.physical() {
            let rule = FlowRule {
                priority: self.flows.flow_priority,
                match_spec: MatchSpec::Exact {
                    in_port: event.in_port,
                    eth_src: event.src,
                    eth_dst: event.dst,
                },
                action,
                buffer_id: event.buffer_id,
            };
            channel.send(event.switch_id, Command::InstallRule(rule));
            EngineStats::bump(&self.stats.flows_installed);
            info!(out_port = %port, "Installed flow");
        } else {
            EngineStats::bump(&self.stats.floods);
            debug!("Destination unknown, flooding");
        }

        let packet = PacketOut {
            buffer_id: event.buffer_id,
            in_port: event.in_port,
            action,
            payload: event.payload,
        };
        channel.send(event.switch_id, Command::EmitFrame(packet));

        EngineStats::bump(&self.stats.packets_emitted);
        EngineStats::bump(&self.stats.frames_processed);
    }
}
