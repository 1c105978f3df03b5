//! In-memory fakes for the event sink trait (testing only)
//!
//! Provides `RecordingSink` and `RejectingSink` that satisfy the
//! `EventSink` contract without any network dependency.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{EventKind, LifecycleEvent};
use crate::notify::{DeliveryError, EventSink};

/// Sink that stores every delivered event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far, in delivery order.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.delivered.lock().unwrap().clone()
    }

    /// Delivered events of one kind.
    pub fn events_of(&self, kind: &EventKind) -> Vec<LifecycleEvent> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Sink that rejects every delivery, for swallow-policy tests.
#[derive(Debug, Default)]
pub struct RejectingSink;

#[async_trait]
impl EventSink for RejectingSink {
    async fn deliver(&self, _event: &LifecycleEvent) -> Result<(), DeliveryError> {
        Err(DeliveryError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        for kind in [EventKind::Launching, EventKind::Completed] {
            sink.deliver(&LifecycleEvent::new(kind, "main", "msg", None))
                .await
                .expect("deliver");
        }

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Launching);
        assert_eq!(events[1].kind, EventKind::Completed);
    }

    #[tokio::test]
    async fn test_rejecting_sink_always_fails() {
        let sink = RejectingSink;
        let result = sink
            .deliver(&LifecycleEvent::new(EventKind::Failed, "main", "msg", None))
            .await;
        assert!(result.is_err());
    }
}
