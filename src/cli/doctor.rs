use clap::Args;

use crate::ansi::{GREEN, RED, RESET};
use crate::cli::State;
use crate::preflight;

/// Diagnose the local container runtime and compose setup
#[derive(Debug, Args)]
pub struct Doctor {}

impl Doctor {
    pub async fn run(self, _state: State) -> eyre::Result<()> {
        let diagnosis = preflight::diagnose().await;

        print_check("docker daemon reachable", diagnosis.docker_running);
        print_check("docker compose (v2) available", diagnosis.compose_available);

        if !diagnosis.docker_running || !diagnosis.compose_available {
            std::process::exit(2);
        }
        Ok(())
    }
}

fn print_check(label: &str, ok: bool) {
    if ok {
        println!("{GREEN}✓{RESET} {label}");
    } else {
        println!("{RED}✗{RESET} {label}");
    }
}
