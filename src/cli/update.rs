use clap::Args;

use crate::cli::State;

/// Check for (but do not perform) a newer release — the update pipeline
/// itself is an external collaborator, out of scope (spec §1)
#[derive(Debug, Args)]
pub struct Update {
    /// only report whether a check is due, don't touch last_update_check
    #[arg(long)]
    check: bool,
}

impl Update {
    pub async fn run(self, mut state: State) -> eyre::Result<()> {
        if self.check {
            println!(
                "update check due: {}",
                state.config.should_check_for_update()
            );
            return Ok(());
        }

        if !state.config.should_check_for_update() {
            println!("up to date (checked recently)");
            return Ok(());
        }

        println!("no self-update pipeline is bundled with this build; see your package manager");
        state.config.last_update_check = jiff::Timestamp::now().as_second();
        state.config.save(&state.data_root)?;
        Ok(())
    }
}
