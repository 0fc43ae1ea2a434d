use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// Truncate a SHA to its first 8 characters for display
pub fn short_sha(sha: &str) -> &str {
    &sha[..8.min(sha.len())]
}

/// A token unique to this squash attempt, used in scratch branch and stash
/// names.
///
/// Process id plus a nanosecond clock reading. Scratch names derived from it
/// are additionally collision-checked against the ref store before use, so a
/// leftover branch from a crashed attempt can never be reused.
pub fn unique_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{}-{}", process::id(), nanos)
}
