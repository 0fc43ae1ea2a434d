//! Application layer: resolves CLI input, drives the engine, renders results.

use log::{info, warn};

use crate::cli::{Command, ListOpts, SquashOpts};
use crate::editor::Editor;
use crate::git::{GitError, GitOps};
use crate::history::{HistoryError, HistoryReader};
use crate::models::{Commit, CommitRange};
use crate::squash::{SquashEngine, SquashError, SquashRequest};
use crate::utils::short_sha;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Squash(#[from] SquashError),
    #[error("Failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

/// The assembled application. Holds no global state; construct one per
/// process (or per test) with its collaborators.
pub struct App<G: GitOps, E: Editor> {
    git: G,
    editor: E,
}

impl<G: GitOps, E: Editor> App<G, E> {
    pub fn new(git: G, editor: E) -> Self {
        Self { git, editor }
    }

    pub fn run(&self, command: Command) -> Result<(), AppError> {
        match command {
            Command::List(opts) => self.handle_list(opts),
            Command::Squash(opts) => self.handle_squash(opts),
        }
    }

    fn handle_list(&self, opts: ListOpts) -> Result<(), AppError> {
        let commits = HistoryReader::new(&self.git).list_recent(opts.limit)?;
        if opts.json {
            println!("{}", serde_json::to_string_pretty(&commits)?);
            return Ok(());
        }
        for commit in &commits {
            println!(
                "{}  {}  {}  {}",
                commit.short_id,
                commit.timestamp.format("%Y-%m-%d"),
                commit.author,
                commit.subject
            );
        }
        Ok(())
    }

    fn handle_squash(&self, opts: SquashOpts) -> Result<(), AppError> {
        let selected = self.resolve_selection(&opts.commits)?;
        let engine = SquashEngine::new(&self.git, &self.editor);

        if opts.dry_run {
            let range = engine.plan(&selected)?;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&range)?);
            } else {
                print_plan(&range);
            }
            return Ok(());
        }

        let outcome = engine.squash(SquashRequest {
            selected,
            message: opts.message,
            no_editor: opts.no_editor,
        })?;

        if opts.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            return Ok(());
        }

        info!(
            "Squashed {} commits into {}",
            outcome.squashed,
            short_sha(&outcome.squash_commit)
        );
        if outcome.skipped > 0 {
            info!(
                "{} selected commits carried no new changes and were folded silently",
                outcome.skipped
            );
        }
        if outcome.reapplied > 0 {
            info!("Reapplied {} commits on top", outcome.reapplied);
        }
        info!("Branch tip is now {}", short_sha(&outcome.new_head));
        Ok(())
    }

    /// Turn user-supplied revisions into commit records, dropping duplicate
    /// spellings of the same commit.
    fn resolve_selection(&self, revs: &[String]) -> Result<Vec<Commit>, AppError> {
        let history = HistoryReader::new(&self.git);
        let mut selected: Vec<Commit> = Vec::with_capacity(revs.len());
        for rev in revs {
            let commit = history.lookup(rev)?;
            if selected.iter().any(|c| c.id == commit.id) {
                warn!(
                    "'{}' selects {} twice; ignoring the duplicate",
                    rev,
                    short_sha(&commit.id)
                );
                continue;
            }
            selected.push(commit);
        }
        Ok(selected)
    }
}

fn print_plan(range: &CommitRange) {
    info!(
        "Would squash {} commits onto {}:",
        range.to_squash.len(),
        short_sha(&range.anchor)
    );
    for commit in &range.to_squash {
        info!("  {}  {}", commit.short_id, commit.subject);
    }
    info!(
        "{} commits reapplied in between, {} after; {} commits rewritten in total",
        range.to_reapply.len(),
        range.later.len(),
        range.total_commits()
    );
}
