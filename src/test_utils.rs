//! Shared test fixtures: canned commits, a scripted editor, and an in-memory
//! gateway that records every call.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use chrono::DateTime;

use crate::editor::{Editor, EditorError};
use crate::git::{GitError, GitOps, RevListEntry};
use crate::models::Commit;

const TEST_AUTHOR: &str = "Test User";
const TEST_DATE: &str = "2026-01-02T03:04:05+00:00";

/// Create a test commit with fixed author and timestamp
pub fn make_commit(id: &str, subject: &str) -> Commit {
    Commit {
        id: id.to_string(),
        short_id: id[..8.min(id.len())].to_string(),
        author: TEST_AUTHOR.to_string(),
        timestamp: DateTime::parse_from_rfc3339(TEST_DATE).expect("fixture date parses"),
        subject: subject.to_string(),
    }
}

/// Editor stand-in with a fixed reaction.
pub struct ScriptedEditor {
    abort: bool,
}

impl ScriptedEditor {
    /// Accepts whatever default it is shown.
    pub fn accept() -> Self {
        Self { abort: false }
    }

    /// Simulates the user abandoning the message.
    pub fn abort() -> Self {
        Self { abort: true }
    }
}

impl Editor for ScriptedEditor {
    fn edit(&self, initial: &str, _comment_help: &str) -> Result<Option<String>, EditorError> {
        if self.abort {
            Ok(None)
        } else {
            Ok(Some(initial.to_string()))
        }
    }
}

/// In-memory linear history plus a log of every gateway call.
///
/// Mutating operations succeed without changing the canned history (except
/// for branch refs and stash entries, which restore logic depends on); tests
/// assert on the recorded call sequence instead of repository contents.
pub struct MockGit {
    /// Commit (id, subject) pairs, oldest first.
    chain: Vec<(String, String)>,
    branch: String,
    dirty: bool,
    /// Commits reported with two parents.
    merges: HashSet<String>,
    /// Picks of these ids fail and report unmerged paths.
    conflicts: HashSet<String>,
    /// Picks of these ids fail and then look like a stopped empty pick.
    empties: HashSet<String>,
    /// Full message bodies; defaults to the subject.
    messages: HashMap<String, String>,
    refs: RefCell<HashSet<String>>,
    stashes: RefCell<Vec<(String, String)>>,
    last_failed_pick: RefCell<Option<String>>,
    calls: RefCell<Vec<String>>,
}

impl MockGit {
    pub fn linear(commits: &[(&str, &str)]) -> Self {
        Self {
            chain: commits
                .iter()
                .map(|(id, subject)| (id.to_string(), subject.to_string()))
                .collect(),
            branch: "main".to_string(),
            dirty: false,
            merges: HashSet::new(),
            conflicts: HashSet::new(),
            empties: HashSet::new(),
            messages: HashMap::new(),
            refs: RefCell::new(HashSet::new()),
            stashes: RefCell::new(Vec::new()),
            last_failed_pick: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn on_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    pub fn merge_at(mut self, id: &str) -> Self {
        self.merges.insert(id.to_string());
        self
    }

    pub fn conflict_on(mut self, id: &str) -> Self {
        self.conflicts.insert(id.to_string());
        self
    }

    pub fn empty_pick_of(mut self, id: &str) -> Self {
        self.empties.insert(id.to_string());
        self
    }

    pub fn with_message(mut self, id: &str, body: &str) -> Self {
        self.messages.insert(id.to_string(), body.to_string());
        self
    }

    /// Fixture commit for an id in the chain.
    pub fn commit(&self, id: &str) -> Commit {
        let (id, subject) = self
            .chain
            .iter()
            .find(|(chain_id, _)| chain_id == id)
            .expect("fixture commit exists in chain");
        make_commit(id, subject)
    }

    pub fn add_ref(&self, name: &str) {
        self.refs.borrow_mut().insert(name.to_string());
    }

    /// Every recorded gateway call, in order.
    pub fn recorded(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Recorded calls that change repository state.
    pub fn mutating_calls(&self) -> Vec<String> {
        const MUTATING: &[&str] = &[
            "checkout",
            "reset --hard",
            "branch -D",
            "cherry-pick",
            "commit-tree",
            "stash push",
            "stash pop",
        ];
        self.calls
            .borrow()
            .iter()
            .filter(|call| MUTATING.iter().any(|prefix| call.starts_with(prefix)))
            .cloned()
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.chain.iter().position(|(chain_id, _)| chain_id == id)
    }

    fn log_line(&self, id: &str, subject: &str) -> String {
        format!(
            "{id}\u{1f}{short}\u{1f}{TEST_AUTHOR}\u{1f}{TEST_DATE}\u{1f}{subject}",
            short = &id[..8.min(id.len())]
        )
    }

    fn parent_count(&self, id: &str) -> usize {
        if self.merges.contains(id) {
            2
        } else {
            1
        }
    }
}

impl GitOps for MockGit {
    fn resolve_ref(&self, rev: &str) -> Result<String, GitError> {
        self.record(format!("rev-parse {rev}"));
        self.chain
            .iter()
            .find(|(id, _)| id == rev || id.starts_with(rev))
            .map(|(id, _)| id.clone())
            .ok_or_else(|| GitError::CommandFailed(format!("unknown revision {rev}")))
    }

    fn get_head(&self) -> Result<String, GitError> {
        self.record("rev-parse HEAD".to_string());
        self.chain
            .last()
            .map(|(id, _)| id.clone())
            .ok_or_else(|| GitError::CommandFailed("no commits".to_string()))
    }

    fn current_branch_name(&self) -> Result<String, GitError> {
        self.record("rev-parse --abbrev-ref HEAD".to_string());
        Ok(self.branch.clone())
    }

    fn ref_exists(&self, name: &str) -> bool {
        self.record(format!("rev-parse --verify {name}"));
        self.refs.borrow().contains(name)
    }

    fn parents_of(&self, rev: &str) -> Result<Vec<String>, GitError> {
        self.record(format!("rev-list --parents -n 1 {rev}"));
        let index = self
            .index_of(rev)
            .ok_or_else(|| GitError::CommandFailed(format!("unknown revision {rev}")))?;
        if index == 0 {
            return Ok(Vec::new());
        }
        let mut parents = vec![self.chain[index - 1].0.clone()];
        if self.merges.contains(rev) {
            parents.push(format!("{rev}-p2"));
        }
        Ok(parents)
    }

    fn is_working_tree_clean(&self) -> Result<bool, GitError> {
        self.record("status --porcelain".to_string());
        Ok(!self.dirty)
    }

    fn log_recent(&self, limit: usize, _format: &str) -> Result<String, GitError> {
        self.record(format!("log -n {limit}"));
        if self.chain.is_empty() {
            return Err(GitError::CommandFailed("no commits yet".to_string()));
        }
        Ok(self
            .chain
            .iter()
            .rev()
            .take(limit)
            .map(|(id, subject)| self.log_line(id, subject))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn commit_line(&self, rev: &str, _format: &str) -> Result<String, GitError> {
        self.record(format!("log -1 {rev}"));
        let index = self
            .index_of(rev)
            .ok_or_else(|| GitError::CommandFailed(format!("unknown revision {rev}")))?;
        let (id, subject) = &self.chain[index];
        Ok(self.log_line(id, subject))
    }

    fn commit_message(&self, rev: &str) -> Result<String, GitError> {
        self.record(format!("log -1 --format=%B {rev}"));
        let index = self
            .index_of(rev)
            .ok_or_else(|| GitError::CommandFailed(format!("unknown revision {rev}")))?;
        let body = self
            .messages
            .get(rev)
            .cloned()
            .unwrap_or_else(|| self.chain[index].1.clone());
        Ok(format!("{body}\n"))
    }

    fn rev_list_range(&self, from: &str, to: &str) -> Result<Vec<RevListEntry>, GitError> {
        self.record(format!("rev-list {from}..{to}"));
        let from_index = self
            .index_of(from)
            .ok_or_else(|| GitError::CommandFailed(format!("unknown revision {from}")))?;
        let to_index = self
            .index_of(to)
            .ok_or_else(|| GitError::CommandFailed(format!("unknown revision {to}")))?;
        if to_index <= from_index {
            return Ok(Vec::new());
        }
        Ok(self.chain[from_index + 1..=to_index]
            .iter()
            .map(|(id, _)| RevListEntry {
                id: id.clone(),
                parents: self.parent_count(id),
            })
            .collect())
    }

    fn rev_list_from(&self, rev: &str) -> Result<Vec<String>, GitError> {
        self.record(format!("rev-list {rev}"));
        let index = self
            .index_of(rev)
            .ok_or_else(|| GitError::CommandFailed(format!("unknown revision {rev}")))?;
        Ok(self.chain[..=index]
            .iter()
            .rev()
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn create_branch_at(&self, branch: &str, target: &str) -> Result<(), GitError> {
        self.record(format!("checkout -b {branch} {target}"));
        self.refs
            .borrow_mut()
            .insert(format!("refs/heads/{branch}"));
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.record(format!("checkout {branch}"));
        Ok(())
    }

    fn reset_hard(&self, rev: &str) -> Result<(), GitError> {
        self.record(format!("reset --hard {rev}"));
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> Result<(), GitError> {
        self.record(format!("branch -D {branch}"));
        self.refs
            .borrow_mut()
            .remove(&format!("refs/heads/{branch}"));
        Ok(())
    }

    fn cherry_pick(&self, rev: &str) -> Result<(), GitError> {
        self.record(format!("cherry-pick {rev}"));
        if self.conflicts.contains(rev) || self.empties.contains(rev) {
            *self.last_failed_pick.borrow_mut() = Some(rev.to_string());
            return Err(GitError::CommandFailed(format!("cherry-pick {rev} failed")));
        }
        Ok(())
    }

    fn cherry_pick_skip(&self) -> Result<(), GitError> {
        self.record("cherry-pick --skip".to_string());
        *self.last_failed_pick.borrow_mut() = None;
        Ok(())
    }

    fn cherry_pick_quit(&self) -> Result<(), GitError> {
        self.record("cherry-pick --quit".to_string());
        *self.last_failed_pick.borrow_mut() = None;
        Ok(())
    }

    fn cherry_pick_in_progress(&self) -> bool {
        self.record("rev-parse --verify CHERRY_PICK_HEAD".to_string());
        self.last_failed_pick.borrow().is_some()
    }

    fn has_unmerged_paths(&self) -> Result<bool, GitError> {
        self.record("ls-files --unmerged".to_string());
        Ok(self
            .last_failed_pick
            .borrow()
            .as_ref()
            .is_some_and(|id| self.conflicts.contains(id)))
    }

    fn index_matches_head(&self) -> bool {
        self.record("diff --cached --quiet".to_string());
        self.last_failed_pick
            .borrow()
            .as_ref()
            .is_some_and(|id| self.empties.contains(id))
    }

    fn tree_of(&self, rev: &str) -> Result<String, GitError> {
        self.record(format!("rev-parse {rev}^{{tree}}"));
        Ok(format!("tree-{rev}"))
    }

    fn commit_tree(&self, tree: &str, parent: &str, _message: &str) -> Result<String, GitError> {
        self.record(format!("commit-tree {tree} -p {parent}"));
        Ok("5qua5hed0000000000000000000000000000000".to_string())
    }

    fn stash_push(&self, token: &str) -> Result<(), GitError> {
        self.record(format!("stash push -m {token}"));
        let mut stashes = self.stashes.borrow_mut();
        let slot = format!("stash@{{{}}}", stashes.len());
        stashes.push((slot, token.to_string()));
        Ok(())
    }

    fn find_stash(&self, token: &str) -> Result<Option<String>, GitError> {
        self.record("stash list".to_string());
        Ok(self
            .stashes
            .borrow()
            .iter()
            .find(|(_, t)| t == token)
            .map(|(slot, _)| slot.clone()))
    }

    fn stash_pop(&self, stash_ref: &str) -> Result<(), GitError> {
        self.record(format!("stash pop {stash_ref}"));
        self.stashes.borrow_mut().retain(|(slot, _)| slot != stash_ref);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_commit() {
        let commit = make_commit("abc123def456", "Test message");
        assert_eq!(commit.id, "abc123def456");
        assert_eq!(commit.short_id, "abc123de");
        assert_eq!(commit.subject, "Test message");
    }

    #[test]
    fn test_mock_git_records_calls() {
        let git = MockGit::linear(&[("aaa", "A"), ("bbb", "B")]);
        git.get_head().unwrap();
        git.reset_hard("aaa").unwrap();

        assert_eq!(git.recorded(), ["rev-parse HEAD", "reset --hard aaa"]);
        assert_eq!(git.mutating_calls(), ["reset --hard aaa"]);
    }

    #[test]
    fn test_mock_git_range_enumeration() {
        let git = MockGit::linear(&[("aaa", "A"), ("bbb", "B"), ("ccc", "C")]);
        let entries = git.rev_list_range("aaa", "ccc").unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["bbb", "ccc"]);
    }
}
