use std::os::unix::process::CommandExt;

use clap::Args;

use crate::cli::State;
use crate::compose_gen::container_name;
use crate::engine::Engine;

/// Exec into a running codespace's container
#[derive(Debug, Args)]
pub struct Exec {
    name: String,

    #[arg(num_args = 0.., allow_hyphen_values = true, trailing_var_arg = true)]
    cmd: Vec<String>,
}

impl Exec {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        // Confirm the codespace exists before replacing this process.
        engine.get(&self.name).await?;

        let mut args = vec!["exec".to_string(), "-it".to_string(), container_name(&self.name)];
        if self.cmd.is_empty() {
            args.push("/bin/sh".to_string());
        } else {
            args.extend(self.cmd);
        }

        // Restore cursor visibility: indicatif hides it for spinners and
        // exec() replaces the process before its cleanup can run.
        let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);

        Err(std::process::Command::new("docker")
            .args(&args)
            .exec()
            .into())
    }
}
