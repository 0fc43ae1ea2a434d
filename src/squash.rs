//! The squash engine: rebuilds the current branch so an arbitrary selection
//! of commits becomes a single commit, and undoes everything on failure.

use log::{debug, info, warn};

use crate::cancel;
use crate::editor::{Editor, EditorError};
use crate::git::{GitError, GitOps};
use crate::history::{HistoryError, HistoryReader};
use crate::message;
use crate::models::{Commit, CommitRange, RepositoryState, SquashOutcome};
use crate::snapshot::StateSnapshot;
use crate::utils::short_sha;

#[derive(Debug, thiserror::Error)]
pub enum SquashError {
    #[error("Select at least two commits to squash")]
    InsufficientSelection,
    #[error("Squashing requires a checked-out branch, not a detached HEAD")]
    DetachedHead,
    #[error("No commit message provided; nothing was changed")]
    NoMessageProvided,
    #[error("Cancelled; nothing was changed")]
    Cancelled,
    #[error("Cherry-pick of {commit} hit a conflict")]
    ReplayConflict { commit: String },
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// One squash attempt's input.
pub struct SquashRequest {
    pub selected: Vec<Commit>,
    /// Explicit message; skips the editor entirely.
    pub message: Option<String>,
    /// Accept the derived default message without opening an editor.
    pub no_editor: bool,
}

/// Outcome of replaying a single commit.
enum Replay {
    Applied,
    Skipped,
}

/// Rewrites the current branch so the selected commits become one commit.
///
/// Each step's precondition is the previous step's committed side effect in
/// the repository, so an attempt is a single linear pipeline of gateway
/// calls; callers must not run two attempts against the same repository at
/// once.
pub struct SquashEngine<'a, G: GitOps, E: Editor> {
    git: &'a G,
    editor: &'a E,
}

impl<'a, G: GitOps, E: Editor> SquashEngine<'a, G, E> {
    pub fn new(git: &'a G, editor: &'a E) -> Self {
        Self { git, editor }
    }

    /// Compute the rewrite plan without touching the repository.
    pub fn plan(&self, selected: &[Commit]) -> Result<CommitRange, SquashError> {
        if selected.len() < 2 {
            return Err(SquashError::InsufficientSelection);
        }
        Ok(HistoryReader::new(self.git).compute_range(selected)?)
    }

    pub fn squash(&self, request: SquashRequest) -> Result<SquashOutcome, SquashError> {
        let range = self.plan(&request.selected)?;
        let message = self.resolve_message(&range, &request)?;

        // Last point where backing out is free.
        if cancel::is_cancelled() {
            return Err(SquashError::Cancelled);
        }

        let snapshot = StateSnapshot::new(self.git);
        let state = snapshot.capture()?;
        if state.branch == "HEAD" {
            return Err(SquashError::DetachedHead);
        }

        info!(
            "squashing {} commits on {}, preserving {}",
            range.to_squash.len(),
            state.branch,
            range.to_reapply.len() + range.later.len()
        );

        // Everything below mutates the repository. Route it through one inner
        // call so restore runs exactly once, on both exit paths.
        let result = self.rewrite(&range, &message, &state);
        let failure_occurred = result.is_err();
        let cleanup_failures = snapshot.restore(&state, failure_occurred);
        if cleanup_failures > 0 {
            warn!(
                "{} cleanup step(s) failed; the repository may need manual attention",
                cleanup_failures
            );
        }
        result
    }

    fn resolve_message(
        &self,
        range: &CommitRange,
        request: &SquashRequest,
    ) -> Result<String, SquashError> {
        if let Some(message) = &request.message {
            if message.trim().is_empty() {
                return Err(SquashError::NoMessageProvided);
            }
            return Ok(message.clone());
        }

        let default = message::default_message(self.git, &range.to_squash)?;
        if request.no_editor {
            if default.trim().is_empty() {
                return Err(SquashError::NoMessageProvided);
            }
            return Ok(default);
        }

        let help = message::editor_help(range);
        match self.editor.edit(&default, &help)? {
            Some(message) => Ok(message),
            None => Err(SquashError::NoMessageProvided),
        }
    }

    /// Steps that change the repository: stash, scratch-branch rewrite,
    /// squash-commit synthesis, reintegration. Only ever called with a
    /// captured state, and the caller restores from it afterwards.
    fn rewrite(
        &self,
        range: &CommitRange,
        message: &str,
        state: &RepositoryState,
    ) -> Result<SquashOutcome, SquashError> {
        if state.had_uncommitted_changes {
            debug!("stashing uncommitted changes as {}", state.stash_token);
            self.git.stash_push(&state.stash_token)?;
        }

        self.git
            .create_branch_at(&state.scratch_branch, &range.anchor)?;

        let mut skipped = 0;
        for commit in &range.to_squash {
            if let Replay::Skipped = self.replay(&commit.id)? {
                skipped += 1;
            }
        }

        let tree = self.git.tree_of("HEAD")?;
        let squash_commit = self.git.commit_tree(&tree, &range.anchor, message)?;
        debug!("created squash commit {}", short_sha(&squash_commit));

        self.git.checkout(&state.branch)?;
        self.git.reset_hard(&squash_commit)?;

        let mut reapplied = 0;
        for id in range.to_reapply.iter().chain(&range.later) {
            if let Replay::Applied = self.replay(id)? {
                reapplied += 1;
            }
        }

        let new_head = self.git.get_head()?;
        Ok(SquashOutcome {
            squash_commit,
            new_head,
            squashed: range.to_squash.len(),
            skipped,
            reapplied,
        })
    }

    /// Re-apply one commit onto HEAD.
    ///
    /// A pick that introduces no content change is skipped. Classification
    /// relies on the tool's own state, never its error text: unmerged paths
    /// mean a conflict, a stopped pick with a clean index means the pick was
    /// empty, and anything else is fatal.
    fn replay(&self, id: &str) -> Result<Replay, SquashError> {
        match self.git.cherry_pick(id) {
            Ok(()) => Ok(Replay::Applied),
            Err(err) => {
                if self.git.has_unmerged_paths()? {
                    return Err(SquashError::ReplayConflict {
                        commit: id.to_string(),
                    });
                }
                if self.git.cherry_pick_in_progress() && self.git.index_matches_head() {
                    debug!("skipping {}: no content change", short_sha(id));
                    self.git.cherry_pick_skip()?;
                    return Ok(Replay::Skipped);
                }
                Err(err.into())
            }
        }
    }
}
