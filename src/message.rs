//! Default message derivation for the squashed commit.

use crate::git::{GitError, GitOps};
use crate::models::{Commit, CommitRange};

/// Derive the default message for the squashed commit.
///
/// Bodies are fetched oldest to newest and kept verbatim apart from trailing
/// whitespace. If every selected commit carries a byte-identical message the
/// default is that single message; otherwise the bodies are concatenated in
/// order, separated by a blank line.
pub fn default_message<G: GitOps>(git: &G, selected: &[Commit]) -> Result<String, GitError> {
    let mut bodies = Vec::with_capacity(selected.len());
    for commit in selected {
        let body = git.commit_message(&commit.id)?;
        bodies.push(body.trim_end().to_string());
    }
    Ok(combine(&bodies))
}

fn combine(bodies: &[String]) -> String {
    match bodies.first() {
        None => String::new(),
        Some(first) if bodies.iter().all(|b| b == first) => first.clone(),
        _ => bodies.join("\n\n"),
    }
}

/// Comment block shown under the message in the editor.
pub fn editor_help(range: &CommitRange) -> String {
    let mut lines = vec![format!("Squashing {} commits:", range.to_squash.len())];
    lines.extend(
        range
            .to_squash
            .iter()
            .map(|c| format!("  {}  {}", c.short_id, c.subject)),
    );

    let preserved = range.to_reapply.len() + range.later.len();
    if preserved > 0 {
        lines.push(String::new());
        lines.push(format!(
            "{} other commits will be reapplied on top.",
            preserved
        ));
    }

    lines.push(String::new());
    lines.push("Lines starting with '#' ignored. Empty message aborts.".to_string());

    lines.join("\n")
}
