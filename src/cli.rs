use std::path::PathBuf;

use bollard::Docker;
use clap::{Parser, Subcommand};

use crate::config::Config;

mod autoupdate;
mod cleanup;
mod create;
mod destroy;
mod doctor;
mod exec;
mod info;
mod list;
mod logs;
mod recover;
mod remove;
mod reset_password;
mod restart;
mod start;
mod status;
mod stop;
mod update;

const ABOUT: &str = "Clone a repo, run it in an isolated container with a browser editor.";

#[derive(Debug, Parser)]
#[command(version, about = ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Everything a verb needs to talk to the engine, assembled once in `main.rs`.
pub struct State {
    pub docker: Docker,
    pub config: Config,
    pub install_root: PathBuf,
    pub data_root: PathBuf,
}

impl Cli {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        match self.command {
            Commands::Create(c) => c.run(state).await,
            Commands::List(c) => c.run(state).await,
            Commands::Start(c) => c.run(state).await,
            Commands::Stop(c) => c.run(state).await,
            Commands::Restart(c) => c.run(state).await,
            Commands::Remove(c) => c.run(state).await,
            Commands::Exec(c) => c.run(state).await,
            Commands::Logs(c) => c.run(state).await,
            Commands::Info(c) => c.run(state).await,
            Commands::Recover(c) => c.run(state).await,
            Commands::ResetPassword(c) => c.run(state).await,
            Commands::Doctor(c) => c.run(state).await,
            Commands::Status(c) => c.run(state).await,
            Commands::Cleanup(c) => c.run(state).await,
            Commands::Destroy(c) => c.run(state).await,
            Commands::Update(c) => c.run(state).await,
            Commands::Autoupdate(c) => c.run(state).await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Create(create::Create),
    #[command(visible_alias = "ls")]
    List(list::List),
    Start(start::Start),
    Stop(stop::Stop),
    Restart(restart::Restart),
    #[command(visible_alias = "rm")]
    Remove(remove::Remove),
    #[command(visible_alias = "x")]
    Exec(exec::Exec),
    Logs(logs::Logs),
    Info(info::Info),
    Recover(recover::Recover),
    ResetPassword(reset_password::ResetPassword),
    Doctor(doctor::Doctor),
    Status(status::Status),
    Cleanup(cleanup::Cleanup),
    Destroy(destroy::Destroy),
    Update(update::Update),
    Autoupdate(autoupdate::Autoupdate),
}
