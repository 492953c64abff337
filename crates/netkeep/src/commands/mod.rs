//! Command handlers.

pub mod backup;
pub mod devices;
pub mod serve;
pub mod subnets;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch every command except `serve`, which owns its own setup.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        Command::Serve(_) => unreachable!("serve is handled before dispatch"),
        Command::Backup(args) => backup::handle(args, global).await,
        Command::Devices(args) => devices::handle(args, global).await,
        Command::Subnets(args) => subnets::handle(args, global).await,
    }
}
