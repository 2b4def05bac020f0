use clap::Args;

use crate::ansi::{GREEN, RESET};
use crate::cli::State;
use crate::compose_gen;
use crate::engine::{self, Engine};

/// Regenerate a codespace's editor password and restart it
#[derive(Debug, Args)]
pub struct ResetPassword {
    name: String,
}

impl ResetPassword {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        let mut view = engine.get(&self.name).await?;

        let new_password = engine::generate_password();
        let codespace_dir = crate::paths::codespace_dir(&state.data_root, &self.name);
        compose_gen::set_password(&codespace_dir, &new_password)?;

        view.codespace.password = new_password;
        view.codespace.write(&codespace_dir)?;

        engine.stop(&self.name).await.ok();
        engine.start(&self.name, || false).await?;

        println!("{GREEN}Password reset{RESET} for {}", self.name);
        Ok(())
    }
}
