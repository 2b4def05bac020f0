use std::io::{BufRead, Write};

use clap::Args;

use crate::ansi::{GREEN, RESET};
use crate::cli::State;
use crate::engine::Engine;

/// Start a stopped codespace
#[derive(Debug, Args)]
pub struct Start {
    name: String,

    /// accept a rebuild prompt non-interactively
    #[arg(long)]
    yes: bool,
}

impl Start {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        let yes = self.yes;
        engine.start(&self.name, move || yes || confirm_rebuild().unwrap_or(false)).await?;
        println!("{GREEN}Started{RESET} {}", self.name);
        Ok(())
    }
}

fn confirm_rebuild() -> eyre::Result<bool> {
    eprint!("Dockerfile changed since last build; rebuild? [y/N] ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
