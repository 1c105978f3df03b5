//! Output sanitization for provisioning logs.
//!
//! Provisioning output arrives with terminal color codes and pages of
//! image-pull progress. Both are stripped before the output is logged
//! or attached to a failure event.

use std::sync::OnceLock;

use regex::Regex;

/// Substrings marking a line as pull/extract progress noise.
const NOISE_MARKERS: &[&str] = &[
    "Downloading",
    "Extracting",
    "Waiting",
    "Verifying",
    "Pull complete",
    "Already exists",
    "Download complete",
    "Pulling from",
    "Pulling fs layer",
    "Digest:",
];

/// ANSI escape sequences: introducer, parameter bytes, final letter.
fn ansi_pattern() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("valid ANSI pattern"))
}

/// Strip ANSI escapes and drop blank or known-noisy lines.
///
/// Surviving lines keep their original order. Deterministic and pure.
pub fn sanitize_output(raw: &str) -> String {
    let stripped = ansi_pattern().replace_all(raw, "");

    stripped
        .split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !NOISE_MARKERS.iter().any(|marker| trimmed.contains(marker))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_ansi_escapes() {
        assert_eq!(sanitize_output("\x1b[31mHello\x1b[0m"), "Hello");
        assert_eq!(sanitize_output("\x1b[1;32mok\x1b[0m done"), "ok done");
    }

    #[test]
    fn test_drops_noise_lines() {
        let raw = "step 1 done\nabc123: Downloading [=====>   ]\nabc123: Pull complete\nstep 2 done";
        assert_eq!(sanitize_output(raw), "step 1 done\nstep 2 done");
    }

    #[test]
    fn test_drops_blank_lines() {
        let raw = "first\n\n   \nsecond";
        assert_eq!(sanitize_output(raw), "first\nsecond");
    }

    #[test]
    fn test_preserves_order_of_survivors() {
        let raw = "alpha\nDigest: sha256:deadbeef\nbravo\nAlready exists\ncharlie";
        assert_eq!(sanitize_output(raw), "alpha\nbravo\ncharlie");
    }

    #[test]
    fn test_clean_input_unchanged() {
        let raw = "creating key pair\ncreating instance";
        assert_eq!(sanitize_output(raw), raw);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize_output(""), "");
    }
}
