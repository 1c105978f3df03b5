//! Inbound launch requests.
//!
//! Token material never leaves the request: `SecretString` has a
//! redacted `Debug` and no `Serialize` impl, so tokens cannot reach
//! logs, event payloads, or process argument lists. They are exposed
//! only at the child-environment boundary.

use secrecy::SecretString;
use serde::Deserialize;

/// Request to launch one deployment. Immutable once accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchRequest {
    /// Requested deployment name; resolved to a free identity before use.
    #[serde(default)]
    pub name: Option<String>,

    /// Credential token handed to the provisioning job (required).
    pub oauth_token: SecretString,

    /// Auxiliary gateway token (optional).
    #[serde(default)]
    pub gateway_token: Option<SecretString>,

    /// Whether to set up the network-tunneling add-on.
    #[serde(default)]
    pub cloudflare: bool,
}

impl LaunchRequest {
    /// Build a request programmatically (tests, embedding callers).
    pub fn new(name: impl Into<String>, oauth_token: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            oauth_token: SecretString::new(oauth_token.into()),
            gateway_token: None,
            cloudflare: false,
        }
    }

    /// Attach the auxiliary gateway token.
    pub fn with_gateway_token(mut self, token: impl Into<String>) -> Self {
        self.gateway_token = Some(SecretString::new(token.into()));
        self
    }

    /// Enable the network-tunneling add-on.
    pub fn with_cloudflare(mut self, enabled: bool) -> Self {
        self.cloudflare = enabled;
        self
    }
}
