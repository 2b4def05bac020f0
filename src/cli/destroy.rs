use std::io::{BufRead, Write};

use clap::Args;

use crate::ansi::{GREEN, RED, RESET};
use crate::cli::State;
use crate::engine::Engine;

/// Remove every managed codespace, running or not — DATA WILL BE LOST
#[derive(Debug, Args)]
pub struct Destroy {
    #[arg(short, long)]
    yes: bool,
}

impl Destroy {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        let views = engine.list().await?;

        if views.is_empty() {
            println!("No codespaces to destroy.");
            return Ok(());
        }

        eprintln!("{RED}Will destroy ALL {} codespaces{RESET} — DATA WILL BE LOST:", views.len());
        for view in &views {
            eprintln!("  {}", view.codespace.name);
        }

        if !self.yes && !confirm()? {
            eprintln!("Aborted.");
            return Ok(());
        }

        for view in views {
            engine.remove(&view.codespace.name, true).await?;
            println!("{GREEN}Destroyed{RESET} {}", view.codespace.name);
        }
        Ok(())
    }
}

fn confirm() -> eyre::Result<bool> {
    eprint!("Proceed? [y/N] ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
