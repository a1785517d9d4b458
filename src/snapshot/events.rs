//! Snapshot lifecycle events.
//!
//! Events go out on a tokio broadcast channel. Subscribers that fall behind
//! lose the oldest events (`RecvError::Lagged`); publishing never blocks and
//! never fails when nobody is listening.

use super::types::Snapshot;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Something that happened to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SnapshotEvent {
    /// A dump is about to be taken.
    Creating {
        file_name: String,
        disk: String,
        connection: String,
        tables: Option<Vec<String>>,
        exclude: Vec<String>,
    },
    /// The snapshot is stored on its disk.
    Created { snapshot: Snapshot },
    /// The snapshot is about to be loaded into a database.
    Loading { snapshot: Snapshot },
    /// The snapshot was loaded.
    Loaded { snapshot: Snapshot },
    /// The snapshot is about to be deleted.
    Deleting { snapshot: Snapshot },
    /// The snapshot file was removed.
    Deleted { file_name: String, disk: String },
}

impl SnapshotEvent {
    /// Short event name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Creating { .. } => "creating",
            Self::Created { .. } => "created",
            Self::Loading { .. } => "loading",
            Self::Loaded { .. } => "loaded",
            Self::Deleting { .. } => "deleting",
            Self::Deleted { .. } => "deleted",
        }
    }

    /// File name the event is about.
    pub fn file_name(&self) -> &str {
        match self {
            Self::Creating { file_name, .. } | Self::Deleted { file_name, .. } => file_name,
            Self::Created { snapshot }
            | Self::Loading { snapshot }
            | Self::Loaded { snapshot }
            | Self::Deleting { snapshot } => &snapshot.file_name,
        }
    }
}

/// Broadcasts [`SnapshotEvent`]s to any number of subscribers.
///
/// Clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<SnapshotEvent>>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribes to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, event: SnapshotEvent) -> usize {
        tracing::debug!(
            event = event.kind(),
            snapshot = event.file_name(),
            "Snapshot event"
        );
        // send() only fails when there are no receivers
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(name: &str) -> SnapshotEvent {
        SnapshotEvent::Deleted {
            file_name: name.to_string(),
            disk: "snapshots".to_string(),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(deleted("a.sql")), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.publish(deleted("a.sql")), 2);

        assert_eq!(first.recv().await.unwrap(), deleted("a.sql"));
        assert_eq!(second.recv().await.unwrap(), deleted("a.sql"));
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(deleted("a.sql")).unwrap();
        assert_eq!(json["event"], "deleted");
        assert_eq!(json["file_name"], "a.sql");
    }
}
