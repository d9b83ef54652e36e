//! Command dispatch: bridges CLI args -> handlers -> output rendering.

pub mod blueprint;
pub mod cluster;
pub mod deployment;
pub mod event;
pub mod extension;
pub mod login;
pub mod network;
pub mod profile;
pub mod role;
pub mod task;
pub mod util;
pub mod vapp;
pub mod vdc;

use crate::cli::Command;
use crate::context::CommandContext;
use crate::error::CliError;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(cmd: Command, ctx: &mut CommandContext) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => login::login(args, ctx).await,
        Command::Logout => login::logout(ctx).await,
        Command::Status => login::status(ctx).await,
        Command::Profile(args) => profile::handle(args, ctx),
        Command::Vdc(args) => vdc::handle(args, ctx).await,
        Command::Vapp(args) => vapp::handle(args, ctx).await,
        Command::Network(args) => network::handle(args, ctx).await,
        Command::Role(args) => role::handle(args, ctx).await,
        Command::Cluster(args) => cluster::handle(args, ctx).await,
        Command::Task(args) => task::handle(args, ctx).await,
        Command::Blueprint(args) => blueprint::handle(args, ctx).await,
        Command::Deployment(args) => deployment::handle(args, ctx).await,
        Command::Event(args) => event::handle(args, ctx).await,
        Command::Extension(args) => extension::handle(&args),
        // Completions are handled before a context exists
        Command::Completions(_) => Err(CliError::Internal(
            "completions are generated before dispatch".into(),
        )),
    }
}
