use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::envelope::Envelope;
use super::ring::BoundedLog;
use crate::config::{BusConfig, DEFAULT_DELTA_CAPACITY, DEFAULT_EVENT_CAPACITY};
use crate::error::BusError;

const BUS_CAPACITY: usize = 1024;

/// Broadcast to subscribers for every envelope accepted into the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreUpdate {
    pub seq: u64,
    pub envelope: Envelope,
    pub is_delta: bool,
    pub received_at: String,
}

/// Point-in-time copy of both logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogSnapshot {
    pub events: Vec<Envelope>,
    pub deltas: Vec<serde_json::Value>,
    pub dropped_events: u64,
    pub dropped_deltas: u64,
}

struct Logs {
    events: BoundedLog<Envelope>,
    deltas: BoundedLog<serde_json::Value>,
    next_seq: u64,
}

/// Owner of the event and delta logs.
///
/// The stream subscriber is the only writer in production. Any number of
/// readers can take snapshots or subscribe to the update broadcast.
pub struct EventBus {
    logs: RwLock<Logs>,
    tx: broadcast::Sender<StoreUpdate>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY, DEFAULT_DELTA_CAPACITY)
    }

    pub fn with_capacity(event_capacity: usize, delta_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            logs: RwLock::new(Logs {
                events: BoundedLog::new(event_capacity),
                deltas: BoundedLog::new(delta_capacity),
                next_seq: 0,
            }),
            tx,
        }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::with_capacity(config.event_capacity, config.delta_capacity)
    }

    /// Parse one raw stream record and append it. A malformed record leaves
    /// both logs untouched.
    pub fn ingest(&self, data: &str) -> Result<StoreUpdate, BusError> {
        let envelope = Envelope::parse(data)?;
        Ok(self.append(envelope))
    }

    /// Append an already-parsed envelope. Delta-tagged envelopes also have
    /// their payload appended to the delta log.
    pub fn append(&self, envelope: Envelope) -> StoreUpdate {
        let is_delta = envelope.is_delta();
        let mut logs = self.logs.write().expect("event bus lock poisoned");

        if is_delta {
            logs.deltas.push(envelope.payload.clone());
        }
        logs.events.push(envelope.clone());

        let seq = logs.next_seq;
        logs.next_seq += 1;

        let update = StoreUpdate {
            seq,
            envelope,
            is_delta,
            received_at: Utc::now().to_rfc3339(),
        };

        // Sent under the lock so subscribers see updates in log order.
        if self.tx.send(update.clone()).is_err() {
            tracing::trace!("event bus update {seq} had no subscribers");
        }
        update
    }

    pub fn events(&self) -> Vec<Envelope> {
        self.logs.read().expect("event bus lock poisoned").events.to_vec()
    }

    pub fn deltas(&self) -> Vec<serde_json::Value> {
        self.logs.read().expect("event bus lock poisoned").deltas.to_vec()
    }

    /// The newest `n` events, oldest first.
    pub fn recent_events(&self, n: usize) -> Vec<Envelope> {
        self.logs.read().expect("event bus lock poisoned").events.tail(n)
    }

    pub fn snapshot(&self) -> LogSnapshot {
        let logs = self.logs.read().expect("event bus lock poisoned");
        LogSnapshot {
            events: logs.events.to_vec(),
            deltas: logs.deltas.to_vec(),
            dropped_events: logs.events.dropped(),
            dropped_deltas: logs.deltas.dropped(),
        }
    }

    pub fn event_count(&self) -> usize {
        self.logs.read().expect("event bus lock poisoned").events.len()
    }

    pub fn delta_count(&self) -> usize {
        self.logs.read().expect("event bus lock poisoned").deltas.len()
    }

    /// Get a new receiver for updates accepted after this call. A receiver
    /// that falls more than 1024 updates behind gets `Lagged`; the logs are
    /// unaffected.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreUpdate> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
