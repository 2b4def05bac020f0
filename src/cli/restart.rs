use clap::Args;

use crate::ansi::{GREEN, RESET};
use crate::cli::State;
use crate::engine::Engine;

/// Restart a codespace: stop, then start
#[derive(Debug, Args)]
pub struct Restart {
    name: String,
}

impl Restart {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        engine.stop(&self.name).await.ok();
        engine.start(&self.name, || false).await?;
        println!("{GREEN}Restarted{RESET} {}", self.name);
        Ok(())
    }
}
