use clap::Parser;
use log::LevelFilter;

use git_coalesce::app::App;
use git_coalesce::cancel;
use git_coalesce::cli::Cli;
use git_coalesce::editor::SystemEditor;
use git_coalesce::git::Git;

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let git = Git::new();
    if let Err(err) = git.ensure_repository() {
        log::error!("{}", err);
        std::process::exit(1);
    }

    cancel::register_handler();

    let app = App::new(git, SystemEditor::new());
    if let Err(err) = app.run(cli.into_command()) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
