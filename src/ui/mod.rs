//! Terminal output and the interactive browser.

mod command;
mod helpers;
mod loop_runner;
mod prompt;
pub mod render;

pub use command::{parse_command, Command, CommandError};
pub use loop_runner::{run, Action, BrowseEvent};
pub use prompt::read_password;
