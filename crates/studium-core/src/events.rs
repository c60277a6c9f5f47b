//! Progress event hub for task and synthesis streams.
//!
//! Long-running work (ingestion, podcast synthesis) publishes discrete
//! progress events keyed by the entity being worked on. SSE handlers
//! subscribe per key; the hub replays the last event for that key on
//! (re)connect, then forwards live events from a broadcast channel.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default broadcast channel capacity.
const HUB_CAPACITY: usize = 256;

/// Stage of a progress stream. Snake-case serialization gives the wire
/// values each stream family uses (`processing`, `synthesizing`,
/// `complete`, `completed`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Pending,
    Processing,
    Completed,
    Synthesizing,
    Complete,
    Downloading,
    Pulling,
    Failed,
    Error,
}

/// A discrete progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: ProgressStage,
    pub progress: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(status: ProgressStage, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: progress.min(100),
            message: message.into(),
        }
    }

    /// Whether this event terminates its stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ProgressStage::Completed
                | ProgressStage::Complete
                | ProgressStage::Failed
                | ProgressStage::Error
        )
    }
}

/// Key identifying one progress stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressKey {
    /// Ingestion progress for a document.
    Document(i64),
    /// Synthesis progress for a podcast version.
    PodcastVersion(i64),
}

/// A keyed event as carried on the broadcast channel.
#[derive(Debug, Clone)]
pub struct KeyedEvent {
    pub key: ProgressKey,
    pub event: ProgressEvent,
}

/// Process-wide progress hub: broadcast fan-out plus a last-event map per
/// key for replay on reconnect.
pub struct ProgressHub {
    tx: broadcast::Sender<KeyedEvent>,
    latest: Mutex<HashMap<ProgressKey, ProgressEvent>>,
}

impl ProgressHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self {
            tx,
            latest: Mutex::new(HashMap::new()),
        }
    }

    /// Publish an event for a key. Events for one key are expected to be
    /// monotonic in `progress`.
    pub fn publish(&self, key: ProgressKey, event: ProgressEvent) {
        {
            let mut latest = self.latest.lock().expect("progress hub lock poisoned");
            latest.insert(key, event.clone());
        }
        // Send fails only when there are no subscribers, which is fine.
        let _ = self.tx.send(KeyedEvent { key, event });
    }

    /// Subscribe to a key's stream. Returns the last event published for
    /// the key (for immediate replay) and a live receiver; the caller
    /// filters received events by key.
    pub fn subscribe(&self, key: ProgressKey) -> (Option<ProgressEvent>, broadcast::Receiver<KeyedEvent>) {
        let rx = self.tx.subscribe();
        let last = {
            let latest = self.latest.lock().expect("progress hub lock poisoned");
            latest.get(&key).cloned()
        };
        (last, rx)
    }

    /// Drop replay state for a key once its stream has been consumed and
    /// the entity deleted.
    pub fn forget(&self, key: ProgressKey) {
        let mut latest = self.latest.lock().expect("progress hub lock poisoned");
        latest.remove(&key);
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ProgressStage::Synthesizing).unwrap(),
            "\"synthesizing\""
        );
        assert_eq!(
            serde_json::to_string(&ProgressStage::Complete).unwrap(),
            "\"complete\""
        );
        assert_eq!(
            serde_json::to_string(&ProgressStage::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn event_clamps_progress() {
        let e = ProgressEvent::new(ProgressStage::Processing, 150, "over");
        assert_eq!(e.progress, 100);
    }

    #[test]
    fn terminal_stages() {
        assert!(ProgressEvent::new(ProgressStage::Complete, 100, "").is_terminal());
        assert!(ProgressEvent::new(ProgressStage::Failed, 10, "").is_terminal());
        assert!(!ProgressEvent::new(ProgressStage::Synthesizing, 50, "").is_terminal());
    }

    #[test]
    fn subscribe_replays_last_event() {
        let hub = ProgressHub::new();
        let key = ProgressKey::PodcastVersion(7);
        hub.publish(key, ProgressEvent::new(ProgressStage::Synthesizing, 40, "Turn 2/5"));

        let (last, _rx) = hub.subscribe(key);
        let last = last.unwrap();
        assert_eq!(last.progress, 40);
        assert_eq!(last.status, ProgressStage::Synthesizing);
    }

    #[test]
    fn subscribe_other_key_sees_nothing() {
        let hub = ProgressHub::new();
        hub.publish(
            ProgressKey::Document(1),
            ProgressEvent::new(ProgressStage::Processing, 10, ""),
        );
        let (last, _rx) = hub.subscribe(ProgressKey::Document(2));
        assert!(last.is_none());
    }

    #[tokio::test]
    async fn live_events_are_broadcast() {
        let hub = ProgressHub::new();
        let key = ProgressKey::Document(3);
        let (_, mut rx) = hub.subscribe(key);

        hub.publish(key, ProgressEvent::new(ProgressStage::Processing, 25, "Chunking"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.key, key);
        assert_eq!(received.event.progress, 25);
    }

    #[test]
    fn forget_clears_replay() {
        let hub = ProgressHub::new();
        let key = ProgressKey::PodcastVersion(9);
        hub.publish(key, ProgressEvent::new(ProgressStage::Complete, 100, ""));
        hub.forget(key);
        let (last, _rx) = hub.subscribe(key);
        assert!(last.is_none());
    }
}
