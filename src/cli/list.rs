use clap::Args;
use tabular::{Row, Table};

use crate::cli::State;
use crate::engine::Engine;

/// List codespaces
#[derive(Debug, Args)]
pub struct List {}

impl List {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;
        let views = engine.list().await?;

        let mut table = Table::new("{:<}  {:<}  {:<}  {:<}");
        table.add_row(Row::new().with_cell("NAME").with_cell("STATUS").with_cell("LANGUAGE").with_cell("REPOSITORY"));
        for view in views {
            table.add_row(
                Row::new()
                    .with_cell(view.codespace.name)
                    .with_cell(view.status.as_str())
                    .with_cell(view.codespace.language.as_str())
                    .with_cell(view.codespace.repository),
            );
        }
        print!("{table}");
        Ok(())
    }
}
