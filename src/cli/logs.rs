use clap::Args;
use futures::StreamExt;

use crate::cli::State;
use crate::engine::Engine;

/// Stream a codespace's container logs
#[derive(Debug, Args)]
pub struct Logs {
    name: String,

    #[arg(short, long)]
    follow: bool,
}

impl Logs {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        let mut stream = Box::pin(engine.logs(&self.name, self.follow).await?);
        while let Some(line) = stream.next().await {
            print!("{}", line?);
        }
        Ok(())
    }
}
