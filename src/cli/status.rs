use clap::Args;

use crate::ansi::{GREEN, RESET};
use crate::cli::State;
use crate::engine::Engine;
use crate::preflight;

/// Summarize runtime health and codespace counts
#[derive(Debug, Args)]
pub struct Status {}

impl Status {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let diagnosis = preflight::diagnose().await;
        println!(
            "runtime: {}",
            if diagnosis.docker_running { "up" } else { "unreachable" }
        );
        println!(
            "compose: {}",
            if diagnosis.compose_available { "available" } else { "missing" }
        );

        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        let views = engine.list().await?;
        let running = views.iter().filter(|v| v.status.as_str() == "running").count();
        println!("codespaces: {} ({GREEN}{running}{RESET} running)", views.len());
        Ok(())
    }
}
