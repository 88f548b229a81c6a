use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use triage_core::EventRecord;

use crate::error::{BrokerError, Result};

/// Health snapshot, analogous to the teacher's `QueueHealth`.
#[derive(Debug, Clone)]
pub struct BrokerHealth {
    pub connected: bool,
    pub stream_depths: HashMap<String, usize>,
}

/// A single pending entry on a stream: the broker-assigned message id and
/// the record itself. Deletion is how the pipeline runtime acks; leaving
/// the entry in place is how it nacks.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message_id: String,
    pub record: EventRecord,
}

/// Durable, ordered, append-only stream abstraction. Appended with an
/// `xadd`-style call, consumed with `xread`+`xdel`: a message is removed
/// from its stream only once the caller has finished processing it.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Appends one record to `stream`, returning the assigned message id.
    async fn append(&self, stream: &str, record: EventRecord) -> Result<String>;

    /// Blocks up to `timeout` waiting for the next pending record on
    /// `stream`. Returns `None` on timeout with nothing to read — the
    /// caller re-blocks.
    async fn read_one(&self, stream: &str, timeout: Duration) -> Result<Option<Delivery>>;

    /// Deletes `message_id` from `stream` — the ack.
    async fn delete(&self, stream: &str, message_id: &str) -> Result<()>;

    async fn health_check(&self) -> Result<BrokerHealth>;
}

struct StreamState {
    pending: VecDeque<(String, EventRecord)>,
    notify: Arc<Notify>,
}

impl StreamState {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            notify: Arc::new(Notify::new()),
        }
    }
}

/// The broker is named as an external collaborator out of scope for this
/// system, but the pipeline still needs something to run and test
/// against — this is that something: an in-process, in-memory stand-in
/// for the streams server, with the same xadd/xread+xdel contract.
pub struct InMemoryBroker {
    streams: Mutex<HashMap<String, StreamState>>,
    next_id: std::sync::atomic::AtomicU64,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            next_id: std::sync::atomic::AtomicU64::new(0),
        }
    }

    fn next_message_id(&self) -> String {
        let n = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("{n}-0")
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn append(&self, stream: &str, record: EventRecord) -> Result<String> {
        let id = self.next_message_id();
        let mut streams = self.streams.lock().await;
        let entry = streams
            .entry(stream.to_string())
            .or_insert_with(StreamState::new);
        entry.pending.push_back((id.clone(), record));
        entry.notify.notify_waiters();
        Ok(id)
    }

    async fn read_one(&self, stream: &str, timeout: Duration) -> Result<Option<Delivery>> {
        loop {
            let notify = {
                let mut streams = self.streams.lock().await;
                let entry = streams
                    .entry(stream.to_string())
                    .or_insert_with(StreamState::new);
                if let Some((message_id, record)) = entry.pending.front().cloned() {
                    return Ok(Some(Delivery { message_id, record }));
                }
                entry.notify.clone()
            };

            let waited = tokio::time::timeout(timeout, notify.notified()).await;
            if waited.is_err() {
                return Ok(None);
            }
            // Something was appended — loop back around and check again.
        }
    }

    async fn delete(&self, stream: &str, message_id: &str) -> Result<()> {
        let mut streams = self.streams.lock().await;
        let entry = streams
            .get_mut(stream)
            .ok_or_else(|| BrokerError::UnknownStream(stream.to_string()))?;
        let before = entry.pending.len();
        entry.pending.retain(|(id, _)| id != message_id);
        if entry.pending.len() == before {
            return Err(BrokerError::NotFound(message_id.to_string()));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<BrokerHealth> {
        let streams = self.streams.lock().await;
        let stream_depths = streams
            .iter()
            .map(|(name, state)| (name.clone(), state.pending.len()))
            .collect();
        Ok(BrokerHealth {
            connected: true,
            stream_depths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use triage_core::EventKind;

    #[tokio::test]
    async fn append_then_read_then_delete_drains_the_stream() {
        let broker = InMemoryBroker::new();
        broker
            .append(
                "event",
                EventRecord::new(EventKind::UserCreate, json!({"user_id": 7})),
            )
            .await
            .unwrap();

        let delivery = broker
            .read_one("event", Duration::from_millis(50))
            .await
            .unwrap()
            .expect("a pending record");
        assert_eq!(delivery.record.kind, EventKind::UserCreate);

        broker.delete("event", &delivery.message_id).await.unwrap();

        let empty = broker.read_one("event", Duration::from_millis(20)).await.unwrap();
        assert!(empty.is_none());
    }

    #[tokio::test]
    async fn nack_leaves_the_record_for_redelivery() {
        let broker = InMemoryBroker::new();
        broker
            .append(
                "event",
                EventRecord::new(EventKind::UserCreate, json!({})),
            )
            .await
            .unwrap();

        let first = broker
            .read_one("event", Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();

        // Simulate a nack: do nothing. The record must still be there.
        let second = broker
            .read_one("event", Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.message_id, second.message_id);
    }

    #[tokio::test]
    async fn read_times_out_on_empty_stream() {
        let broker = InMemoryBroker::new();
        let result = broker
            .read_one("verification", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
