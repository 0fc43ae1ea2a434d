//! Capture and restore of repository state around a rewrite.

use log::{debug, warn};

use crate::git::{GitError, GitOps};
use crate::models::RepositoryState;
use crate::utils::unique_token;

const SCRATCH_PREFIX: &str = "coalesce";

/// Captures a recoverable description of the repository before a rewrite and
/// knows how to put everything back.
pub struct StateSnapshot<'a, G: GitOps> {
    git: &'a G,
}

impl<'a, G: GitOps> StateSnapshot<'a, G> {
    pub fn new(git: &'a G) -> Self {
        Self { git }
    }

    /// Record the current branch, head, and working-tree dirtiness, and pick
    /// names for this attempt's scratch branch and stash entry. Mutates
    /// nothing.
    pub fn capture(&self) -> Result<RepositoryState, GitError> {
        let branch = self.git.current_branch_name()?;
        let original_head = self.git.get_head()?;
        let clean = self.git.is_working_tree_clean()?;
        let token = unique_token();

        Ok(RepositoryState {
            branch,
            original_head,
            scratch_branch: self.unused_scratch_name(&token),
            had_uncommitted_changes: !clean,
            stash_token: format!("{}-{}", SCRATCH_PREFIX, token),
        })
    }

    /// A scratch branch name no existing ref uses.
    fn unused_scratch_name(&self, token: &str) -> String {
        let mut name = format!("{}/{}", SCRATCH_PREFIX, token);
        let mut attempt = 0;
        while self.git.ref_exists(&format!("refs/heads/{}", name)) {
            attempt += 1;
            name = format!("{}/{}-{}", SCRATCH_PREFIX, token, attempt);
        }
        name
    }

    /// Put the repository back: abandon any stopped cherry-pick, return to
    /// the original branch, rewind its pointer when the attempt failed,
    /// delete the scratch branch, and re-apply stashed changes.
    ///
    /// Safe to call twice: every step is guarded by an existence check, so
    /// "scratch branch already deleted" and "nothing to unstash" are quiet
    /// no-ops. Returns the number of cleanup steps that failed; failures are
    /// logged rather than raised so they can never mask the error that
    /// triggered the restore.
    pub fn restore(&self, state: &RepositoryState, failure_occurred: bool) -> usize {
        let mut failures = 0;

        if self.git.cherry_pick_in_progress() {
            attempt(&mut failures, "abandon cherry-pick", self.git.cherry_pick_quit());
            // A conflicted pick leaves merge markers in the tree; clear them
            // before switching branches.
            attempt(&mut failures, "clear working tree", self.git.reset_hard("HEAD"));
        }

        attempt(
            &mut failures,
            "switch back to original branch",
            self.git.checkout(&state.branch),
        );

        if failure_occurred {
            debug!("rewinding {} to {}", state.branch, state.original_head);
            attempt(
                &mut failures,
                "rewind branch pointer",
                self.git.reset_hard(&state.original_head),
            );
        }

        if self
            .git
            .ref_exists(&format!("refs/heads/{}", state.scratch_branch))
        {
            attempt(
                &mut failures,
                "delete scratch branch",
                self.git.delete_branch(&state.scratch_branch),
            );
        }

        if state.had_uncommitted_changes {
            match self.git.find_stash(&state.stash_token) {
                Ok(Some(stash_ref)) => attempt(
                    &mut failures,
                    "restore stashed changes",
                    self.git.stash_pop(&stash_ref),
                ),
                Ok(None) => {} // already restored, or never stashed
                Err(err) => {
                    warn!("cleanup: failed to look up stash entry: {}", err);
                    failures += 1;
                }
            }
        }

        failures
    }
}

fn attempt(failures: &mut usize, what: &str, result: Result<(), GitError>) {
    if let Err(err) = result {
        warn!("cleanup: failed to {}: {}", what, err);
        *failures += 1;
    }
}
