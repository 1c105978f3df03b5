//! Deployment pipeline: launch supervision and device approval.
//!
//! One `Pipeline` coordinates every deployment on the host. A launch
//! runs on its own background task: the trigger path gets an immediate
//! handle back and observes the outcome only through the relayed event
//! stream. The run registry is the single piece of shared state; its
//! lock is never held across spawn, wait, or delivery.

use std::process::Stdio;
use std::sync::Arc;

use secrecy::ExposeSecret;
use serde_json::json;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::domain::{
    normalize_identity, ApproveError, EventKind, LaunchError, LaunchRequest, LifecycleEvent,
    Result, DEFAULT_DEPLOYMENT,
};
use crate::notify::{EventSink, HttpEventSink, Notifier};
use crate::registry::{RegistrationGuard, RunHandle, RunRegistry};
use crate::resolver::resolve_name;
use crate::sanitize::sanitize_output;

/// Child environment variable carrying the credential token.
pub const OAUTH_TOKEN_ENV: &str = "SLIPWAY_OAUTH_TOKEN";

/// Child environment variable carrying the optional gateway token.
pub const GATEWAY_TOKEN_ENV: &str = "SLIPWAY_GATEWAY_TOKEN";

/// Coordinator for deployment launches, approvals and event relay.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    registry: Arc<RunRegistry>,
    notifier: Arc<Notifier>,
}

impl Pipeline {
    /// Pipeline delivering events to the given sink.
    pub fn new(config: PipelineConfig, sink: Arc<dyn EventSink>) -> Self {
        Pipeline {
            config: Arc::new(config),
            registry: Arc::new(RunRegistry::new()),
            notifier: Arc::new(Notifier::new(sink)),
        }
    }

    /// Pipeline delivering events to the configured HTTP observer.
    pub fn with_http_sink(config: PipelineConfig) -> Self {
        let sink = HttpEventSink::new(config.sink_endpoint(), config.delivery_timeout);
        Self::new(config, Arc::new(sink))
    }

    /// Resolve a requested name to a free identity and report whether
    /// that identity is already running.
    pub fn resolve_and_check(&self, requested: &str) -> (String, bool) {
        let requested = normalize_identity(requested);
        let resolved = resolve_name(&self.config.work_dir, &requested);
        let running = self.registry.is_running(&resolved);
        (resolved, running)
    }

    /// Snapshot of currently running identities.
    pub fn running_names(&self) -> Vec<String> {
        self.registry.running_names()
    }

    /// Launch a deployment in the background.
    ///
    /// Returns immediately with the task handle; success or failure is
    /// observable only through the event stream. The provisioning
    /// process runs to completion — there is no cancellation.
    pub fn launch(&self, request: LaunchRequest) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.run_launch(request).await })
    }

    /// One deployment's full lifecycle: conflict check, launching
    /// event, spawn, wait, terminal event, deregistration.
    async fn run_launch(&self, request: LaunchRequest) {
        let name = normalize_identity(request.name.as_deref().unwrap_or(""));

        // Check-and-register is one critical section; the placeholder
        // makes the identity visible to `is_running` before any process
        // exists.
        if !self.registry.try_register(&name, RunHandle::placeholder()) {
            warn!(name = %name, "rejecting launch: deployment already running");
            self.notifier
                .send(
                    &name,
                    EventKind::Failed,
                    LaunchError::AlreadyRunning(name.clone()).to_string(),
                    None,
                )
                .await;
            return;
        }
        let _guard = RegistrationGuard::new(self.registry.clone(), name.clone());

        self.notifier
            .send(
                &name,
                EventKind::Launching,
                format!("starting provisioning for {name}"),
                Some(json!({ "name": name, "cloudflare": request.cloudflare })),
            )
            .await;

        match self.execute_provision(&name, &request).await {
            Ok(output) => {
                info!(name = %name, output = %output, "provisioning completed");
                self.notifier
                    .send(
                        &name,
                        EventKind::Completed,
                        format!("deployment complete for {name}"),
                        Some(json!({ "name": name })),
                    )
                    .await;
            }
            Err(err) => {
                let data = match &err {
                    LaunchError::Exit { output, .. } => {
                        error!(name = %name, error = %err, output = %output, "provisioning failed");
                        json!({ "name": name, "error": output })
                    }
                    _ => {
                        error!(name = %name, error = %err, "provisioning failed");
                        json!({ "name": name })
                    }
                };
                self.notifier
                    .send(&name, EventKind::Failed, err.to_string(), Some(data))
                    .await;
            }
        }
        // _guard removes the registry entry here, unconditionally.
    }

    /// Spawn the provisioning job and wait for it off the trigger path.
    ///
    /// Returns the sanitized combined output on success; failures carry
    /// the sanitized output as the error detail.
    async fn execute_provision(&self, name: &str, request: &LaunchRequest) -> Result<String> {
        let mut command = self.provision_command(name, request)?;

        let mut child = command.spawn().map_err(LaunchError::Spawn)?;
        if let Some(pid) = child.id() {
            self.registry.attach_pid(name, pid);
        }

        let output = child.wait_with_output().await.map_err(LaunchError::Spawn)?;
        let cleaned = sanitize_output(&combined_output(&output.stdout, &output.stderr));

        if output.status.success() {
            Ok(cleaned)
        } else {
            Err(LaunchError::Exit {
                code: output.status.code().unwrap_or(-1),
                output: cleaned,
            })
        }
    }

    /// Assemble the provisioning command for one launch.
    ///
    /// Identity and tunneling flag travel as arguments; both tokens
    /// travel only through the child environment so they never show up
    /// in process listings.
    fn provision_command(&self, name: &str, request: &LaunchRequest) -> Result<Command> {
        let argv = &self.config.provision_command;
        let program = argv.first().ok_or_else(|| {
            LaunchError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "provision command is empty",
            ))
        })?;

        let mut command = Command::new(program);
        command
            .args(&argv[1..])
            .arg(format!("NAME={name}"))
            .arg(format!("CLOUDFLARE={}", request.cloudflare))
            .current_dir(&self.config.work_dir)
            .env(OAUTH_TOKEN_ENV, request.oauth_token.expose_secret())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(token) = &request.gateway_token {
            command.env(GATEWAY_TOKEN_ENV, token.expose_secret());
        }

        Ok(command)
    }

    /// Trigger device approval for a deployment.
    ///
    /// Synchronous relative to the caller; short-lived by contract of
    /// the approval command. Does not consult the run registry.
    pub async fn approve(&self, name: &str) -> Result<String, ApproveError> {
        let name = normalize_identity(name);

        self.notifier
            .send(
                &name,
                EventKind::ApproveTriggered,
                format!("triggering device approval for {name}"),
                None,
            )
            .await;

        let argv = &self.config.approve_command;
        let program = argv.first().ok_or_else(|| {
            ApproveError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "approve command is empty",
            ))
        })?;

        let result = Command::new(program)
            .args(&argv[1..])
            .arg(format!("NAME={name}"))
            .current_dir(&self.config.work_dir)
            .output()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                self.notifier
                    .send(
                        &name,
                        EventKind::ApproveFailed,
                        format!("approval failed: {err}"),
                        None,
                    )
                    .await;
                return Err(ApproveError::Spawn(err));
            }
        };

        let combined = combined_output(&output.stdout, &output.stderr);
        info!(name = %name, output = %combined, "approval command finished");

        if output.status.success() {
            self.notifier
                .send(
                    &name,
                    EventKind::ApproveSuccess,
                    format!("device approved for {name}"),
                    Some(json!({ "output": combined })),
                )
                .await;
            Ok(combined)
        } else {
            self.notifier
                .send(
                    &name,
                    EventKind::ApproveFailed,
                    format!("approval failed: {combined}"),
                    None,
                )
                .await;
            Err(ApproveError::CommandFailed {
                code: output.status.code().unwrap_or(-1),
                output: combined,
            })
        }
    }

    /// Intake for events the provisioning job reports back through the
    /// transport layer.
    ///
    /// The event is forwarded verbatim (unknown kinds included); a
    /// `pairing_required` event additionally auto-triggers approval as
    /// a background task, and `cloudflare_ready` gets its message — a
    /// connectable URL — logged prominently.
    pub async fn handle_external_event(&self, mut event: LifecycleEvent) {
        if event.name.trim().is_empty() {
            event.name = DEFAULT_DEPLOYMENT.to_string();
        }

        info!(
            name = %event.name,
            kind = %event.kind,
            message = %event.message,
            "provisioning event received"
        );

        if event.kind == EventKind::CloudflareReady {
            info!("========================================");
            info!("  tunnel URL [{}]: {}", event.name, event.message);
            info!("========================================");
        }

        let auto_approve = event.kind == EventKind::PairingRequired;
        let name = event.name.clone();

        self.notifier.forward(event).await;

        if auto_approve {
            let pipeline = self.clone();
            tokio::spawn(async move {
                if let Err(err) = pipeline.approve(&name).await {
                    error!(name = %name, error = %err, "auto-triggered approval failed");
                }
            });
        }
    }
}

/// Stdout followed by stderr, lossily decoded.
///
/// The pipes are captured separately, so the interleaving of the
/// original stream is not reproducible; nothing downstream depends on
/// it.
fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&String::from_utf8_lossy(stderr));
    }
    combined
}
