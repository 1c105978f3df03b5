//! Domain-level error taxonomy for Slipway.

/// Errors terminating a single deployment launch.
///
/// Launch failures are never returned to the trigger path; they are
/// rendered into a `failed` lifecycle event for the one identity they
/// concern. The typed taxonomy exists so the supervisor and its tests
/// can distinguish the transitions.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("deployment already running for {0}")]
    AlreadyRunning(String),

    #[error("failed to start provisioning: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("provisioning exited with {code}")]
    Exit {
        code: i32,
        /// Sanitized combined output, carried into the `failed` event.
        output: String,
    },
}

/// Errors returned by the device-approval trigger.
#[derive(Debug, thiserror::Error)]
pub enum ApproveError {
    #[error("failed to start approval command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("approval failed: {output}")]
    CommandFailed { code: i32, output: String },
}

/// Result type for Slipway domain operations.
pub type Result<T, E = LaunchError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_display() {
        let err = LaunchError::AlreadyRunning("main".to_string());
        assert!(err.to_string().contains("already running for main"));

        let err = LaunchError::Exit {
            code: 2,
            output: "boom".to_string(),
        };
        assert!(err.to_string().contains("exited with 2"));
    }

    #[test]
    fn test_approve_error_carries_output() {
        let err = ApproveError::CommandFailed {
            code: 1,
            output: "pairing code rejected".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("approval failed"));
        assert!(msg.contains("pairing code rejected"));
    }
}
