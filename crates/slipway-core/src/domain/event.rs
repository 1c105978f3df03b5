//! Lifecycle events and their wire format.
//!
//! Events are the only channel through which the outcome of a launch is
//! observable. The wire shape is fixed by the remote observer:
//! `{"type": ..., "name": ..., "message": ..., "timestamp": ..., "data": ...}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a lifecycle event.
///
/// The first group is emitted by this coordinator itself; the second is
/// emitted by the provisioning job and merely relayed. Unrecognized
/// kinds from the job pass through untouched via `Other` — relayed
/// kinds are never validated against the known set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // Emitted by the coordinator (launch / approval lifecycle)
    Launching,
    Completed,
    Failed,
    ApproveTriggered,
    ApproveSuccess,
    ApproveFailed,

    // Emitted by the provisioning job (log monitoring), relayed only
    CreatingKey,
    CreatingConfig,
    CreatingEc2,
    DeployingApp,
    PullingImage,
    StartingApp,
    HealthCheck,
    SettingUpCloudflare,
    AutoApproving,
    PairingRequired,
    CloudflareReady,

    /// Any kind this coordinator does not recognize.
    #[serde(untagged)]
    Other(String),
}

impl EventKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Launching => "launching",
            EventKind::Completed => "completed",
            EventKind::Failed => "failed",
            EventKind::ApproveTriggered => "approve_triggered",
            EventKind::ApproveSuccess => "approve_success",
            EventKind::ApproveFailed => "approve_failed",
            EventKind::CreatingKey => "creating_key",
            EventKind::CreatingConfig => "creating_config",
            EventKind::CreatingEc2 => "creating_ec2",
            EventKind::DeployingApp => "deploying_app",
            EventKind::PullingImage => "pulling_image",
            EventKind::StartingApp => "starting_app",
            EventKind::HealthCheck => "health_check",
            EventKind::SettingUpCloudflare => "setting_up_cloudflare",
            EventKind::AutoApproving => "auto_approving",
            EventKind::PairingRequired => "pairing_required",
            EventKind::CloudflareReady => "cloudflare_ready",
            EventKind::Other(kind) => kind,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event in a deployment's lifecycle.
///
/// Constructed fresh for each local transition, or accepted verbatim
/// when relayed from the provisioning job. Immutable once built; the
/// relay fills a missing timestamp at forward time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event classification.
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Deployment identity this event belongs to.
    pub name: String,

    /// Human-readable progress message.
    pub message: String,

    /// When the event occurred (UTC). Filled by the relay when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Event-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl LifecycleEvent {
    /// Create a new event stamped with the current UTC time.
    pub fn new(
        kind: EventKind,
        name: impl Into<String>,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            message: message.into(),
            timestamp: Some(Utc::now()),
            data,
        }
    }
}
