pub mod app;
pub mod cancel;
pub mod cli;
pub mod editor;
pub mod git;
pub mod history;
pub mod message;
pub mod models;
pub mod snapshot;
pub mod squash;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
