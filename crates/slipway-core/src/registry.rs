//! Registry of in-flight deployment runs.
//!
//! The single source of truth for "is this identity running". The lock
//! is held only for map reads and writes, never across process spawn,
//! wait, or any I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// Registry-owned record of one registered run.
///
/// Registered as a placeholder (no pid) inside the same critical
/// section as the conflict check, before the process exists; the pid is
/// attached once the spawn succeeds. Never handed out of the registry.
#[derive(Debug)]
pub struct RunHandle {
    pub registered_at: DateTime<Utc>,
    pub pid: Option<u32>,
}

impl RunHandle {
    /// Handle for a run whose process has not been spawned yet.
    pub fn placeholder() -> Self {
        RunHandle {
            registered_at: Utc::now(),
            pid: None,
        }
    }
}

/// Mutex-guarded table of running deployments, keyed by identity.
#[derive(Debug, Default)]
pub struct RunRegistry {
    running: Mutex<HashMap<String, RunHandle>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` currently has a registered run.
    pub fn is_running(&self, name: &str) -> bool {
        let running = self.running.lock().expect("registry poisoned");
        running.contains_key(name)
    }

    /// Snapshot of all running identities. Order is not significant.
    pub fn running_names(&self) -> Vec<String> {
        let running = self.running.lock().expect("registry poisoned");
        running.keys().cloned().collect()
    }

    /// Register `name` iff it is not already present.
    ///
    /// Check and insert happen under one lock acquisition, so exactly
    /// one of any number of concurrent callers wins. `false` means the
    /// caller must abort without spawning a process.
    pub fn try_register(&self, name: &str, handle: RunHandle) -> bool {
        let mut running = self.running.lock().expect("registry poisoned");
        if running.contains_key(name) {
            return false;
        }
        running.insert(name.to_string(), handle);
        true
    }

    /// Fill in the pid once the process has spawned. No-op when the
    /// entry has already been removed.
    pub fn attach_pid(&self, name: &str, pid: u32) {
        let mut running = self.running.lock().expect("registry poisoned");
        if let Some(handle) = running.get_mut(name) {
            handle.pid = Some(pid);
        }
    }

    /// Remove `name`. Idempotent.
    pub fn unregister(&self, name: &str) {
        let mut running = self.running.lock().expect("registry poisoned");
        running.remove(name);
    }
}

/// Removes its identity from the registry on drop.
///
/// The launch supervisor arms one right after registration, so the
/// entry is gone after the terminal transition no matter how that
/// code path exits.
pub struct RegistrationGuard {
    registry: Arc<RunRegistry>,
    name: String,
}

impl RegistrationGuard {
    pub fn new(registry: Arc<RunRegistry>, name: impl Into<String>) -> Self {
        RegistrationGuard {
            registry,
            name: name.into(),
        }
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.name);
    }
}
