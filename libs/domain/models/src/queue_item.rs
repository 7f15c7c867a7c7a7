use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::log_event::LogEvent;

/// Ephemeral, queue-resident envelope. Multiply-enqueued items are
/// tolerated — the queue's contract is at-least-once delivery to the
/// storage worker, never exactly-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub event: LogEvent,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(event: LogEvent, enqueued_at: DateTime<Utc>) -> Self {
        Self { event, enqueued_at }
    }

    /// Compact binary encoding used on the wire to/from the queue
    /// substrate (MessagePack, matching the internal RPC encoding so a
    /// single decode path serves both).
    pub fn encode(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}
