use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A commit read from the branch history.
///
/// Ordering between two commits is decided by ancestry, never by timestamp:
/// selections arrive in arbitrary order and author dates can be arbitrary too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    /// Full object id; stable identity within a repository.
    pub id: String,
    /// Abbreviated id for display.
    pub short_id: String,
    pub author: String,
    /// Author date, parsed from git's strict ISO-8601 output.
    pub timestamp: DateTime<FixedOffset>,
    /// First line of the commit message. Full bodies are fetched separately,
    /// because a body can contain any byte including our field separator.
    pub subject: String,
}

/// The slice of history affected by one squash attempt.
///
/// `to_squash`, `to_reapply`, and `later` together cover exactly the commits
/// in `anchor..original_tip`, each exactly once. A commit missing from this
/// partition is a commit lost from the rewritten branch.
#[derive(Debug, Clone, Serialize)]
pub struct CommitRange {
    /// Parent of the earliest selected commit; the rewrite's new base.
    pub anchor: String,
    /// Branch head at the time the range was computed.
    pub original_tip: String,
    /// The selected commits, oldest first.
    pub to_squash: Vec<Commit>,
    /// Unselected commits between the earliest and latest selected commit,
    /// oldest first. Replayed directly after the squash commit.
    pub to_reapply: Vec<String>,
    /// Commits after the latest selected commit up to the tip, oldest first.
    /// Always replayed last.
    pub later: Vec<String>,
}

impl CommitRange {
    /// Every commit the rewrite touches.
    pub fn total_commits(&self) -> usize {
        self.to_squash.len() + self.to_reapply.len() + self.later.len()
    }
}

/// Everything needed to put the repository back the way it was.
///
/// Captured once per attempt immediately before the first mutating command,
/// consulted by the restore routine, and discarded afterwards. Never
/// persisted.
#[derive(Debug, Clone)]
pub struct RepositoryState {
    pub branch: String,
    pub original_head: String,
    /// Unique per attempt, so leftovers from a crashed run cannot collide
    /// with a new one.
    pub scratch_branch: String,
    pub had_uncommitted_changes: bool,
    /// Identifies this attempt's stash entry. Meaningful only when
    /// `had_uncommitted_changes` is set.
    pub stash_token: String,
}

/// Result of a completed squash, returned to the caller for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct SquashOutcome {
    /// The synthesized commit that replaces the selection.
    pub squash_commit: String,
    /// Branch tip after reintegration.
    pub new_head: String,
    /// Number of selected commits folded into the squash commit.
    pub squashed: usize,
    /// Selected commits whose changes were already present and were skipped.
    pub skipped: usize,
    /// Preserved commits replayed on top of the squash commit.
    pub reapplied: usize,
}
