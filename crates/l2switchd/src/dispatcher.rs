//! Per-switch event dispatch.
//!
//! Each switch gets a dedicated worker task fed by its own queue, so events
//! for one switch are handled strictly in arrival order while different
//! switches proceed concurrently.

use crate::channel::SwitchChannel;
use crate::engine::ForwardingEngine;
use crate::events::SwitchEvent;
use sdn_types::SwitchId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Routes events to one ordered worker per switch.
pub struct Dispatcher {
    engine: Arc<ForwardingEngine>,
    channel: Arc<dyn SwitchChannel>,
    workers: HashMap<SwitchId, mpsc::UnboundedSender<SwitchEvent>>,
    tasks: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(engine: Arc<ForwardingEngine>, channel: Arc<dyn SwitchChannel>) -> Self {
        Self {
            engine,
            channel,
            workers: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Number of switches with a running worker.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues `event` on its switch's worker, starting the worker if needed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, event: SwitchEvent) {
        let switch_id = event.switch_id();

        if !self.workers.contains_key(&switch_id) {
            let tx = self.spawn_worker(switch_id);
            self.workers.insert(switch_id, tx);
        }

        if let Some(tx) = self.workers.get(&switch_id) {
            if tx.send(event).is_err() {
                warn!(switch = %switch_id, "Switch worker has stopped, dropping event");
            }
        }
    }

    fn spawn_worker(&mut self, switch_id: SwitchId) -> mpsc::UnboundedSender<SwitchEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel::<SwitchEvent>();
        let engine = Arc::clone(&self.engine);
        let channel = Arc::clone(&self.channel);

        self.tasks.spawn(async move {
            while let Some(event) = rx.recv().await {
                engine.handle(event, channel.as_ref());
            }
            debug!(switch = %switch_id, "Switch worker stopped");
        });

        debug!(switch = %switch_id, "Started switch worker");
        tx
    }

    /// Dispatches events until the source closes or `cancel` fires, then
    /// drains every worker.
    pub async fn run(mut self, mut events: mpsc::Receiver<SwitchEvent>, cancel: CancellationToken) {
        info!("Dispatcher running");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Dispatcher cancelled");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => {
                        info!("Event source closed");
                        break;
                    }
                },
            }
        }

        self.shutdown().await;
    }

    /// Closes every worker queue and waits for queued events to be handled.
    pub async fn shutdown(mut self) {
        let workers = self.workers.len();
        self.workers.clear();

        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Switch worker failed");
            }
        }

        info!(workers, "Dispatcher stopped");
    }
}
