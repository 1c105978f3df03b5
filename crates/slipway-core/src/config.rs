//! Pipeline configuration.
//!
//! Everything the coordinator needs to know about its environment:
//! where the provisioning tree lives, which commands to run, and where
//! lifecycle events are delivered.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the deployment pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Provisioning working directory. Commands run here; state markers
    /// are probed beneath it.
    pub work_dir: PathBuf,

    /// Base URL of the remote observer. Events POST to
    /// `<sink_url>/api/webhook/pipeline`.
    pub sink_url: String,

    /// Argv vector for the provisioning job. `NAME=<identity>` and
    /// `CLOUDFLARE=<bool>` are appended per launch.
    pub provision_command: Vec<String>,

    /// Argv vector for device approval. `NAME=<identity>` is appended.
    pub approve_command: Vec<String>,

    /// Timeout for one event delivery attempt.
    pub delivery_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            work_dir: PathBuf::from(
                std::env::var("SLIPWAY_WORK_DIR").unwrap_or_else(|_| "/app/pipeline".to_string()),
            ),
            sink_url: std::env::var("SLIPWAY_SINK_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            provision_command: vec!["make".to_string(), "ec2-full-setup".to_string()],
            approve_command: vec!["make".to_string(), "ec2-approve".to_string()],
            delivery_timeout: Duration::from_secs(5),
        }
    }
}

impl PipelineConfig {
    /// Create a config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config rooted at a specific working directory.
    pub fn new(work_dir: impl Into<PathBuf>, sink_url: &str) -> Self {
        PipelineConfig {
            work_dir: work_dir.into(),
            sink_url: sink_url.to_string(),
            ..Self::default()
        }
    }

    /// Override the provisioning command.
    pub fn with_provision_command(mut self, command: Vec<String>) -> Self {
        self.provision_command = command;
        self
    }

    /// Override the approval command.
    pub fn with_approve_command(mut self, command: Vec<String>) -> Self {
        self.approve_command = command;
        self
    }

    /// Full endpoint events are delivered to.
    pub fn sink_endpoint(&self) -> String {
        format!("{}/api/webhook/pipeline", self.sink_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::from_env();
        assert!(!config.sink_url.is_empty());
        assert!(!config.provision_command.is_empty());
        assert!(!config.approve_command.is_empty());
        assert_eq!(config.delivery_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_new() {
        let config = PipelineConfig::new("/srv/pipeline", "http://observer:3000");
        assert_eq!(config.work_dir, PathBuf::from("/srv/pipeline"));
        assert_eq!(config.sink_url, "http://observer:3000");
    }

    #[test]
    fn test_sink_endpoint_handles_trailing_slash() {
        let config = PipelineConfig::new(".", "http://observer:3000/");
        assert_eq!(
            config.sink_endpoint(),
            "http://observer:3000/api/webhook/pipeline"
        );
    }

    #[test]
    fn test_command_overrides() {
        let config = PipelineConfig::new(".", "http://observer:3000")
            .with_provision_command(vec!["sh".to_string(), "-c".to_string(), "true".to_string()])
            .with_approve_command(vec!["true".to_string()]);
        assert_eq!(config.provision_command[0], "sh");
        assert_eq!(config.approve_command, vec!["true".to_string()]);
    }
}
