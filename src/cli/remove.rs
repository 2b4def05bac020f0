use clap::Args;

use crate::ansi::{GREEN, RESET};
use crate::cli::State;
use crate::engine::Engine;

/// Remove a codespace: container, ports, and directory
#[derive(Debug, Args)]
pub struct Remove {
    name: String,

    #[arg(short, long)]
    force: bool,
}

impl Remove {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        engine.remove(&self.name, self.force).await?;
        println!("{GREEN}Removed{RESET} {}", self.name);
        Ok(())
    }
}
