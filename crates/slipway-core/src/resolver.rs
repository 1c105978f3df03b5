//! Deployment identity resolution.
//!
//! Each deployment that has ever been provisioned leaves a state
//! marker on disk. A requested name that collides with an existing
//! marker is suffixed with the first free number (`ducdv` → `ducdv1`
//! → `ducdv2` …), so repeated launches get distinct identities.

use std::path::{Path, PathBuf};

/// Probing stops after this many suffix candidates.
const MAX_SUFFIX_PROBES: u32 = 100;

/// Path of the state marker for `name` under `work_dir`.
pub fn state_marker_path(work_dir: &Path, name: &str) -> PathBuf {
    work_dir
        .join("terraform")
        .join("ec2")
        .join(format!("terraform-{name}.tfstate"))
}

/// Pick a free deployment identity for `requested`.
///
/// Returns `requested` unchanged when no marker exists for it, else the
/// first numbered candidate without a marker. When every bounded
/// candidate is taken the original name comes back unchanged — the
/// registry conflict check still guards the actual launch. Purely
/// observational; no files are created.
pub fn resolve_name(work_dir: &Path, requested: &str) -> String {
    if !state_marker_path(work_dir, requested).exists() {
        return requested.to_string();
    }

    for i in 1..=MAX_SUFFIX_PROBES {
        let candidate = format!("{requested}{i}");
        if !state_marker_path(work_dir, &candidate).exists() {
            return candidate;
        }
    }

    requested.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn mark(dir: &Path, name: &str) {
        let marker = state_marker_path(dir, name);
        fs::create_dir_all(marker.parent().expect("marker parent")).expect("create marker dir");
        fs::write(marker, b"{}").expect("write marker");
    }

    #[test]
    fn test_unused_name_resolves_to_itself() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(resolve_name(dir.path(), "ducdv"), "ducdv");
    }

    #[test]
    fn test_taken_name_gets_first_free_suffix() {
        let dir = tempfile::tempdir().expect("tempdir");
        mark(dir.path(), "ducdv");
        assert_eq!(resolve_name(dir.path(), "ducdv"), "ducdv1");
    }

    #[test]
    fn test_probing_skips_taken_suffixes() {
        let dir = tempfile::tempdir().expect("tempdir");
        mark(dir.path(), "ducdv");
        mark(dir.path(), "ducdv1");
        mark(dir.path(), "ducdv2");
        assert_eq!(resolve_name(dir.path(), "ducdv"), "ducdv3");
    }

    #[test]
    fn test_exhausted_probes_fall_back_to_requested() {
        let dir = tempfile::tempdir().expect("tempdir");
        mark(dir.path(), "busy");
        for i in 1..=MAX_SUFFIX_PROBES {
            mark(dir.path(), &format!("busy{i}"));
        }
        assert_eq!(resolve_name(dir.path(), "busy"), "busy");
    }
}
