use std::io::{BufRead, Write};

use clap::Args;

use crate::ansi::{GREEN, RESET, YELLOW};
use crate::cli::State;
use crate::engine::Engine;

/// Remove every stopped codespace
#[derive(Debug, Args)]
pub struct Cleanup {
    /// skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

impl Cleanup {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        let views = engine.list().await?;
        let stopped: Vec<_> = views.into_iter().filter(|v| v.status.as_str() == "stopped").collect();

        if stopped.is_empty() {
            println!("Nothing to clean up.");
            return Ok(());
        }

        eprintln!("{YELLOW}Will remove{RESET} (data will be lost):");
        for view in &stopped {
            eprintln!("  {}", view.codespace.name);
        }

        if !self.yes && !confirm()? {
            eprintln!("Aborted.");
            return Ok(());
        }

        for view in stopped {
            engine.remove(&view.codespace.name, true).await?;
            println!("{GREEN}Removed{RESET} {}", view.codespace.name);
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
