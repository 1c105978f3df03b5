//! Slipway Core Library
//!
//! Deployment launch coordination: resolves deployment identities,
//! enforces one run per identity, supervises the external provisioning
//! job, and relays lifecycle events to a remote observer.

pub mod config;
pub mod domain;
pub mod fakes;
pub mod notify;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod sanitize;
pub mod telemetry;

pub use config::PipelineConfig;
pub use domain::{
    normalize_identity, ApproveError, EventKind, LaunchError, LaunchRequest, LifecycleEvent,
    DEFAULT_DEPLOYMENT,
};
pub use notify::{DeliveryError, EventSink, HttpEventSink, Notifier};
pub use pipeline::{Pipeline, GATEWAY_TOKEN_ENV, OAUTH_TOKEN_ENV};
pub use registry::{RegistrationGuard, RunHandle, RunRegistry};
pub use resolver::{resolve_name, state_marker_path};
pub use sanitize::sanitize_output;
pub use telemetry::init_tracing;

/// Slipway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
