use clap::Args;

use crate::ansi::{GREEN, RESET};
use crate::cli::State;
use crate::engine::Engine;
use crate::orchestrator::{self, ContainerState};

/// Re-create a codespace's container after it's gone missing or wedged
#[derive(Debug, Args)]
pub struct Recover {
    name: String,
}

impl Recover {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        engine.get(&self.name).await?;

        let container = crate::compose_gen::container_name(&self.name);
        let current = orchestrator::container_state(&state.docker, &container).await?;
        if current != ContainerState::Absent {
            orchestrator::remove(&state.docker, &container, true).await?;
        }

        let codespace_dir = crate::paths::codespace_dir(&state.data_root, &self.name);
        orchestrator::ComposeExecutor::up(&codespace_dir).await?;
        println!("{GREEN}Recovered{RESET} {}", self.name);
        Ok(())
    }
}
