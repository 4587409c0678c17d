//! Command dispatch: bridges CLI args -> core controllers -> output formatting.

pub mod all;
pub mod config_cmd;
pub mod list;
pub mod mutate;
pub mod util;

use staffdesk_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => list::handle(console, args, global).await,
        Command::All(args) => all::handle(console, args, global).await,
        Command::Create(args) => mutate::create(console, args, global).await,
        Command::Update(args) => mutate::update(console, args, global).await,
        Command::Delete(args) => mutate::delete(console, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
