use std::io::Write;
use std::path::Path;
use std::process::Command;

/// Errors from git operations
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("Git command failed: {0}")]
    CommandFailed(String),
    #[error("Failed to execute git: {0}")]
    ExecutionFailed(#[from] std::io::Error),
    #[error("Not a git repository")]
    NotARepository,
}

/// One line of `rev-list --parents` output: a commit and how many parents it
/// has. The parent count is what lets range computation refuse to rewrite
/// across a merge.
#[derive(Debug, Clone)]
pub struct RevListEntry {
    pub id: String,
    pub parents: usize,
}

/// Trait for git operations - allows mocking in tests.
///
/// Every method wraps exactly one git invocation; this is the only boundary
/// to the external tool.
pub trait GitOps {
    /// Resolve a revision (branch name, tag, SHA prefix) to a full commit SHA
    fn resolve_ref(&self, rev: &str) -> Result<String, GitError>;

    /// Get the current HEAD SHA
    fn get_head(&self) -> Result<String, GitError>;

    /// Get the current branch name ("HEAD" if detached)
    fn current_branch_name(&self) -> Result<String, GitError>;

    /// Whether a fully qualified ref currently exists
    fn ref_exists(&self, name: &str) -> bool;

    /// Parent ids of a commit (empty for a root commit)
    fn parents_of(&self, rev: &str) -> Result<Vec<String>, GitError>;

    /// True when `git status --porcelain` reports nothing
    fn is_working_tree_clean(&self) -> Result<bool, GitError>;

    /// Raw log lines for the most recent non-merge commits, newest first
    fn log_recent(&self, limit: usize, format: &str) -> Result<String, GitError>;

    /// Metadata line for a single commit in the given format
    fn commit_line(&self, rev: &str, format: &str) -> Result<String, GitError>;

    /// Full commit message body (%B), verbatim
    fn commit_message(&self, rev: &str) -> Result<String, GitError>;

    /// Commits in `from..to`, oldest first, with parent counts
    fn rev_list_range(&self, from: &str, to: &str) -> Result<Vec<RevListEntry>, GitError>;

    /// All commits reachable from `rev` in topological order, newest first
    fn rev_list_from(&self, rev: &str) -> Result<Vec<String>, GitError>;

    /// Create `branch` at `target` and switch to it
    fn create_branch_at(&self, branch: &str, target: &str) -> Result<(), GitError>;

    /// Switch to an existing branch
    fn checkout(&self, branch: &str) -> Result<(), GitError>;

    /// Hard reset to a revision (discards all changes)
    fn reset_hard(&self, rev: &str) -> Result<(), GitError>;

    /// Force-delete a branch
    fn delete_branch(&self, branch: &str) -> Result<(), GitError>;

    /// Apply the change introduced by `rev` onto HEAD
    fn cherry_pick(&self, rev: &str) -> Result<(), GitError>;

    /// Drop the current (stopped) pick and continue the sequence
    fn cherry_pick_skip(&self) -> Result<(), GitError>;

    /// Forget an in-progress cherry-pick without touching the working tree
    fn cherry_pick_quit(&self) -> Result<(), GitError>;

    /// True while a cherry-pick is stopped partway
    fn cherry_pick_in_progress(&self) -> bool;

    /// True when the index contains unmerged (conflicted) paths
    fn has_unmerged_paths(&self) -> Result<bool, GitError>;

    /// True when the index matches the HEAD tree (nothing staged)
    fn index_matches_head(&self) -> bool;

    /// Tree id of a revision
    fn tree_of(&self, rev: &str) -> Result<String, GitError>;

    /// Create a commit object for `tree` with `parent`, returning the new id
    fn commit_tree(&self, tree: &str, parent: &str, message: &str) -> Result<String, GitError>;

    /// Stash working-tree changes (including untracked files) under `token`
    fn stash_push(&self, token: &str) -> Result<(), GitError>;

    /// Stash ref (`stash@{n}`) whose message carries `token`, if any
    fn find_stash(&self, token: &str) -> Result<Option<String>, GitError>;

    /// Re-apply and drop a stash entry
    fn stash_pop(&self, stash_ref: &str) -> Result<(), GitError>;
}

/// Real implementation of GitOps that calls git commands
pub struct Git {
    /// Working directory for git commands
    work_dir: Option<std::path::PathBuf>,
}

impl Git {
    pub fn new() -> Self {
        Self { work_dir: None }
    }

    pub fn with_work_dir(work_dir: impl AsRef<Path>) -> Self {
        Self {
            work_dir: Some(work_dir.as_ref().to_path_buf()),
        }
    }

    /// Check that the working directory is inside a git repository.
    pub fn ensure_repository(&self) -> Result<(), GitError> {
        self.run_git(&["rev-parse", "--git-dir"])
            .map(|_| ())
            .map_err(|_| GitError::NotARepository)
    }

    fn run_git(&self, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        if let Some(ref dir) = self.work_dir {
            cmd.current_dir(dir);
        }
        cmd.args(args);

        let output = cmd.output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOps for Git {
    fn resolve_ref(&self, rev: &str) -> Result<String, GitError> {
        let spec = format!("{}^{{commit}}", rev);
        let output = self.run_git(&["rev-parse", "--verify", &spec])?;
        Ok(output.trim().to_string())
    }

    fn get_head(&self) -> Result<String, GitError> {
        let output = self.run_git(&["rev-parse", "HEAD"])?;
        Ok(output.trim().to_string())
    }

    fn current_branch_name(&self) -> Result<String, GitError> {
        let output = self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(output.trim().to_string())
    }

    fn ref_exists(&self, name: &str) -> bool {
        self.run_git(&["rev-parse", "-q", "--verify", name]).is_ok()
    }

    fn parents_of(&self, rev: &str) -> Result<Vec<String>, GitError> {
        let output = self.run_git(&["rev-list", "--parents", "-n", "1", rev])?;
        let mut ids = output.split_whitespace().map(str::to_string);
        ids.next(); // the commit itself
        Ok(ids.collect())
    }

    fn is_working_tree_clean(&self) -> Result<bool, GitError> {
        let output = self.run_git(&["status", "--porcelain"])?;
        Ok(output.trim().is_empty())
    }

    fn log_recent(&self, limit: usize, format: &str) -> Result<String, GitError> {
        let count = limit.to_string();
        let format_arg = format!("--format={}", format);
        self.run_git(&["log", "--no-merges", "-n", &count, &format_arg])
    }

    fn commit_line(&self, rev: &str, format: &str) -> Result<String, GitError> {
        let format_arg = format!("--format={}", format);
        let output = self.run_git(&["log", "-1", &format_arg, rev])?;
        Ok(output.trim_end_matches('\n').to_string())
    }

    fn commit_message(&self, rev: &str) -> Result<String, GitError> {
        self.run_git(&["log", "-1", "--format=%B", rev])
    }

    fn rev_list_range(&self, from: &str, to: &str) -> Result<Vec<RevListEntry>, GitError> {
        let range = format!("{}..{}", from, to);
        let output = self.run_git(&[
            "rev-list",
            "--reverse",
            "--topo-order",
            "--parents",
            &range,
        ])?;
        Ok(parse_rev_list_parents(&output))
    }

    fn rev_list_from(&self, rev: &str) -> Result<Vec<String>, GitError> {
        let output = self.run_git(&["rev-list", "--topo-order", rev])?;
        Ok(output.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    fn create_branch_at(&self, branch: &str, target: &str) -> Result<(), GitError> {
        self.run_git(&["checkout", "-b", branch, target])?;
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.run_git(&["checkout", branch])?;
        Ok(())
    }

    fn reset_hard(&self, rev: &str) -> Result<(), GitError> {
        self.run_git(&["reset", "--hard", rev])?;
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> Result<(), GitError> {
        self.run_git(&["branch", "-D", branch])?;
        Ok(())
    }

    fn cherry_pick(&self, rev: &str) -> Result<(), GitError> {
        self.run_git(&["cherry-pick", rev])?;
        Ok(())
    }

    fn cherry_pick_skip(&self) -> Result<(), GitError> {
        self.run_git(&["cherry-pick", "--skip"])?;
        Ok(())
    }

    fn cherry_pick_quit(&self) -> Result<(), GitError> {
        self.run_git(&["cherry-pick", "--quit"])?;
        Ok(())
    }

    fn cherry_pick_in_progress(&self) -> bool {
        self.run_git(&["rev-parse", "-q", "--verify", "CHERRY_PICK_HEAD"])
            .is_ok()
    }

    fn has_unmerged_paths(&self) -> Result<bool, GitError> {
        let output = self.run_git(&["ls-files", "--unmerged"])?;
        Ok(!output.trim().is_empty())
    }

    fn index_matches_head(&self) -> bool {
        // Exit code 1 means staged differences; any other failure is treated
        // the same, which errs toward "not empty".
        self.run_git(&["diff", "--cached", "--quiet"]).is_ok()
    }

    fn tree_of(&self, rev: &str) -> Result<String, GitError> {
        let spec = format!("{}^{{tree}}", rev);
        let output = self.run_git(&["rev-parse", &spec])?;
        Ok(output.trim().to_string())
    }

    fn commit_tree(&self, tree: &str, parent: &str, message: &str) -> Result<String, GitError> {
        // Write the message to a temp file to handle multiline messages
        let mut temp_file = tempfile::NamedTempFile::new()?;
        temp_file.write_all(message.as_bytes())?;
        temp_file.flush()?;

        let path = temp_file.path().to_string_lossy().to_string();
        let output = self.run_git(&["commit-tree", tree, "-p", parent, "-F", &path])?;
        Ok(output.trim().to_string())
    }

    fn stash_push(&self, token: &str) -> Result<(), GitError> {
        self.run_git(&["stash", "push", "--include-untracked", "-m", token])?;
        Ok(())
    }

    fn find_stash(&self, token: &str) -> Result<Option<String>, GitError> {
        let output = self.run_git(&["stash", "list", "--format=%gd %gs"])?;
        Ok(match_stash_line(&output, token))
    }

    fn stash_pop(&self, stash_ref: &str) -> Result<(), GitError> {
        self.run_git(&["stash", "pop", stash_ref])?;
        Ok(())
    }
}

/// Parse `rev-list --parents` output: each line is a commit id followed by
/// its parent ids.
fn parse_rev_list_parents(output: &str) -> Vec<RevListEntry> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?.to_string();
            Some(RevListEntry {
                id,
                parents: fields.count(),
            })
        })
        .collect()
}

/// Find the stash ref whose reflog subject carries `token`.
fn match_stash_line(output: &str, token: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains(token))
        .and_then(|line| line.split_whitespace().next())
        .map(str::to_string)
}
