//! Commit listing and affected-range computation.

use std::collections::{HashMap, HashSet};

use chrono::DateTime;
use log::debug;

use crate::git::{GitError, GitOps};
use crate::models::{Commit, CommitRange};

/// Field separator for machine-readable log output. The unit separator cannot
/// appear in ids, author names, or ISO dates. Subjects can contain anything,
/// so parsing splits off exactly the first four fields and takes the rest of
/// the line verbatim; full bodies are never read through this format at all.
const FIELD_SEP: char = '\x1f';
const LOG_FORMAT: &str = "%H%x1f%h%x1f%an%x1f%aI%x1f%s";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Could not read commit history: {0}")]
    Unavailable(#[source] GitError),
    #[error("Could not parse log output: {0}")]
    Parse(String),
    #[error("Could not resolve '{0}' to a commit")]
    UnknownRevision(String),
    #[error("Commit {0} is the root commit; there is no parent to rebuild onto")]
    NoParentForAnchor(String),
    #[error("Commit {0} is not part of the current branch's history")]
    OutsideLinearHistory(String),
    #[error("Commit {0} is a merge; squashing across merges is not supported")]
    MergeInRange(String),
}

/// Reads linear, non-merge history and derives ancestry relationships.
pub struct HistoryReader<'a, G: GitOps> {
    git: &'a G,
}

impl<'a, G: GitOps> HistoryReader<'a, G> {
    pub fn new(git: &'a G) -> Self {
        Self { git }
    }

    /// The most recent non-merge commits on the current branch, newest first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<Commit>, HistoryError> {
        let raw = self
            .git
            .log_recent(limit, LOG_FORMAT)
            .map_err(HistoryError::Unavailable)?;
        raw.lines()
            .filter(|line| !line.is_empty())
            .map(parse_commit_line)
            .collect()
    }

    /// Resolve a user-supplied revision to a commit record.
    pub fn lookup(&self, rev: &str) -> Result<Commit, HistoryError> {
        let id = self
            .git
            .resolve_ref(rev)
            .map_err(|_| HistoryError::UnknownRevision(rev.to_string()))?;
        let parents = self.git.parents_of(&id).map_err(HistoryError::Unavailable)?;
        if parents.len() > 1 {
            return Err(HistoryError::MergeInRange(id));
        }
        let line = self
            .git
            .commit_line(&id, LOG_FORMAT)
            .map_err(HistoryError::Unavailable)?;
        parse_commit_line(&line)
    }

    /// Partition the history affected by squashing `selected`.
    ///
    /// The selection is ordered by ancestry (a user may pick commits in any
    /// order), the enumeration between the earliest selection's parent and
    /// the latest selection is split into squashed and preserved commits, and
    /// everything after the latest selection becomes the trailing segment.
    /// The three sequences cover `anchor..tip` exactly once each; the replay
    /// loops depend on that.
    pub fn compute_range(&self, selected: &[Commit]) -> Result<CommitRange, HistoryError> {
        let tip = self.git.get_head().map_err(HistoryError::Unavailable)?;

        // Positions in the tip-first enumeration: a larger index is older.
        let reachable = self
            .git
            .rev_list_from(&tip)
            .map_err(HistoryError::Unavailable)?;
        let position: HashMap<&str, usize> = reachable
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();

        let mut ordered: Vec<Commit> = selected.to_vec();
        for commit in &ordered {
            if !position.contains_key(commit.id.as_str()) {
                return Err(HistoryError::OutsideLinearHistory(commit.id.clone()));
            }
        }
        ordered.sort_by(|a, b| position[b.id.as_str()].cmp(&position[a.id.as_str()]));

        if ordered.is_empty() {
            return Err(HistoryError::Parse("empty selection".to_string()));
        }
        let earliest = ordered[0].id.clone();
        let latest = ordered[ordered.len() - 1].id.clone();

        let parents = self
            .git
            .parents_of(&earliest)
            .map_err(HistoryError::Unavailable)?;
        let anchor = match parents.first() {
            Some(parent) => parent.clone(),
            None => return Err(HistoryError::NoParentForAnchor(earliest)),
        };

        let middle = self
            .git
            .rev_list_range(&anchor, &latest)
            .map_err(HistoryError::Unavailable)?;
        for entry in &middle {
            if entry.parents > 1 {
                return Err(HistoryError::MergeInRange(entry.id.clone()));
            }
        }

        // Every selected commit must be inside the enumerated segment, or the
        // partition would silently drop it from the rewritten branch.
        let enumerated: HashSet<&str> = middle.iter().map(|e| e.id.as_str()).collect();
        for commit in &ordered {
            if !enumerated.contains(commit.id.as_str()) {
                return Err(HistoryError::OutsideLinearHistory(commit.id.clone()));
            }
        }

        let selected_ids: HashSet<&str> = ordered.iter().map(|c| c.id.as_str()).collect();
        let to_reapply: Vec<String> = middle
            .into_iter()
            .filter(|entry| !selected_ids.contains(entry.id.as_str()))
            .map(|entry| entry.id)
            .collect();

        let mut later = Vec::new();
        for entry in self
            .git
            .rev_list_range(&latest, &tip)
            .map_err(HistoryError::Unavailable)?
        {
            if entry.parents > 1 {
                return Err(HistoryError::MergeInRange(entry.id));
            }
            later.push(entry.id);
        }

        debug!(
            "range: {} to squash, {} preserved in between, {} after",
            ordered.len(),
            to_reapply.len(),
            later.len()
        );

        Ok(CommitRange {
            anchor,
            original_tip: tip,
            to_squash: ordered,
            to_reapply,
            later,
        })
    }
}

fn parse_commit_line(line: &str) -> Result<Commit, HistoryError> {
    let mut fields = line.splitn(5, FIELD_SEP);
    let (Some(id), Some(short_id), Some(author), Some(date), Some(subject)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(HistoryError::Parse(format!(
            "expected 5 fields in log line '{}'",
            line
        )));
    };

    let timestamp = DateTime::parse_from_rfc3339(date)
        .map_err(|e| HistoryError::Parse(format!("bad author date '{}': {}", date, e)))?;

    Ok(Commit {
        id: id.to_string(),
        short_id: short_id.to_string(),
        author: author.to_string(),
        timestamp,
        subject: subject.to_string(),
    })
}
