use clap::Args;

use crate::cli::State;
use crate::engine::Engine;

/// Show details for a single codespace
#[derive(Debug, Args)]
pub struct Info {
    name: String,
}

impl Info {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        let view = engine.get(&self.name).await?;
        let cs = view.codespace;
        println!("name:       {}", cs.name);
        println!("status:     {}", view.status.as_str());
        println!("repository: {}", cs.repository);
        println!("path:       {}", cs.path.display());
        println!("language:   {}", cs.language.as_str());
        println!("components: {}", cs.components.join(", "));
        println!("editor:     {}", cs.vscode_url);
        println!("app:        {}", cs.app_url);
        println!("created:    {}", cs.created_at);
        Ok(())
    }
}
