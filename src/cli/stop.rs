use clap::Args;

use crate::ansi::{GREEN, RESET};
use crate::cli::State;
use crate::engine::Engine;

/// Stop a running codespace
#[derive(Debug, Args)]
pub struct Stop {
    name: String,
}

impl Stop {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        engine.stop(&self.name).await?;
        println!("{GREEN}Stopped{RESET} {}", self.name);
        Ok(())
    }
}
