//! Lifecycle event relay.
//!
//! Events flow from the supervisor (and from the provisioning job via
//! the transport layer) to a remote observer. Delivery is best-effort
//! by policy: a failure is representable and inspectable here, but the
//! relay boundary logs and discards it. Losing an event degrades
//! observability only; it must never abort or corrupt a deployment.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{EventKind, LifecycleEvent};

/// Errors from one delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("serializing event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("delivering event: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sink rejected event with status {status}")]
    Status { status: reqwest::StatusCode },
}

/// Destination for relayed lifecycle events.
///
/// Guarantees expected of implementations:
/// - One bounded attempt per call; no internal retries.
/// - Failure is returned, not panicked.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), DeliveryError>;
}

/// Production sink: POSTs JSON events to the observer endpoint.
pub struct HttpEventSink {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpEventSink {
    /// Sink posting to `endpoint` with a per-request `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("slipway/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("default TLS backend available");

        HttpEventSink {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(event)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status { status });
        }
        Ok(())
    }
}

/// Builds lifecycle events and relays them to the configured sink.
pub struct Notifier {
    sink: Arc<dyn EventSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Notifier { sink }
    }

    /// Build an event stamped with the current UTC time and forward it.
    pub async fn send(
        &self,
        name: &str,
        kind: EventKind,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        self.forward(LifecycleEvent::new(kind, name, message, data))
            .await;
    }

    /// Relay an event, filling a missing timestamp.
    ///
    /// Delivery failure is logged and swallowed — never propagated,
    /// never retried.
    pub async fn forward(&self, event: LifecycleEvent) {
        if let Err(err) = self.try_forward(event).await {
            warn!(error = %err, "event delivery failed (observer may be offline)");
        }
    }

    /// Same relay path with the delivery outcome surfaced.
    pub async fn try_forward(&self, mut event: LifecycleEvent) -> Result<(), DeliveryError> {
        if event.timestamp.is_none() {
            event.timestamp = Some(Utc::now());
        }

        info!(
            name = %event.name,
            kind = %event.kind,
            message = %event.message,
            "relaying lifecycle event"
        );

        self.sink.deliver(&event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{RecordingSink, RejectingSink};

    #[tokio::test]
    async fn test_send_builds_timestamped_event() {
        let sink = Arc::new(RecordingSink::new());
        let notifier = Notifier::new(sink.clone());

        notifier
            .send(
                "main",
                EventKind::Launching,
                "starting provisioning for main",
                Some(serde_json::json!({"cloudflare": false})),
            )
            .await;

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Launching);
        assert_eq!(events[0].name, "main");
        assert!(events[0].timestamp.is_some());
    }

    #[tokio::test]
    async fn test_forward_fills_missing_timestamp() {
        let sink = Arc::new(RecordingSink::new());
        let notifier = Notifier::new(sink.clone());

        let event = LifecycleEvent {
            kind: EventKind::PullingImage,
            name: "main".to_string(),
            message: "pulling app image".to_string(),
            timestamp: None,
            data: None,
        };
        notifier.forward(event).await;

        assert!(sink.events()[0].timestamp.is_some());
    }

    #[tokio::test]
    async fn test_forward_keeps_existing_timestamp() {
        let sink = Arc::new(RecordingSink::new());
        let notifier = Notifier::new(sink.clone());

        let stamp = "2026-01-02T03:04:05Z".parse().expect("timestamp");
        let event = LifecycleEvent {
            kind: EventKind::HealthCheck,
            name: "main".to_string(),
            message: "checking".to_string(),
            timestamp: Some(stamp),
            data: None,
        };
        notifier.forward(event).await;

        assert_eq!(sink.events()[0].timestamp, Some(stamp));
    }

    #[tokio::test]
    async fn test_forward_swallows_delivery_failure() {
        let notifier = Notifier::new(Arc::new(RejectingSink));

        // Must not panic or propagate.
        notifier
            .send("main", EventKind::Completed, "deployment complete", None)
            .await;
    }

    #[tokio::test]
    async fn test_try_forward_surfaces_delivery_failure() {
        let notifier = Notifier::new(Arc::new(RejectingSink));

        let result = notifier
            .try_forward(LifecycleEvent::new(
                EventKind::Failed,
                "main",
                "provisioning failed",
                None,
            ))
            .await;

        assert!(matches!(result, Err(DeliveryError::Status { .. })));
    }
}
