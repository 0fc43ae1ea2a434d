use clap::Parser;

/// Command line interface definition for git-coalesce.
#[derive(Parser, Debug)]
#[command(name = "git-coalesce")]
#[command(about = "Squash any selection of commits on the current branch into one commit")]
#[command(version)]
pub struct Cli {
    /// Commits to squash, in any order (SHA, short SHA, or any revision)
    #[arg(value_name = "COMMIT", conflicts_with = "list")]
    commits: Vec<String>,

    /// List recent candidate commits and exit
    #[arg(long)]
    list: bool,

    /// How many commits --list shows
    #[arg(long, default_value_t = 30, env = "GIT_COALESCE_LIMIT")]
    limit: usize,

    /// Message for the squashed commit (skips the editor)
    #[arg(short, long, conflicts_with = "list")]
    message: Option<String>,

    /// Accept the derived default message without opening an editor
    #[arg(long, conflicts_with_all = ["list", "message"])]
    no_editor: bool,

    /// Show the rewrite plan without changing anything
    #[arg(long, conflicts_with = "list")]
    dry_run: bool,

    /// Emit machine-readable JSON instead of human output
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Convert parsed CLI flags into a concrete command for the application layer.
    pub fn into_command(self) -> Command {
        if self.list {
            return Command::List(ListOpts {
                limit: self.limit,
                json: self.json,
            });
        }

        Command::Squash(SquashOpts {
            commits: self.commits,
            message: self.message,
            no_editor: self.no_editor,
            dry_run: self.dry_run,
            json: self.json,
        })
    }
}

/// Command selected by CLI parsing.
pub enum Command {
    List(ListOpts),
    Squash(SquashOpts),
}

/// Options for listing candidate commits.
pub struct ListOpts {
    pub limit: usize,
    pub json: bool,
}

/// Options for running a squash.
pub struct SquashOpts {
    pub commits: Vec<String>,
    pub message: Option<String>,
    pub no_editor: bool,
    pub dry_run: bool,
    pub json: bool,
}
