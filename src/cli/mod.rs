//! CLI module - command-line arguments and the interactive shell

mod args;
mod command;
mod shell;

pub use args::*;
pub use command::*;
pub use shell::*;
