#![forbid(unsafe_code)]

use clap::Parser;
use color_eyre::config::HookBuilder;

use mcsd::cli::{Cli, State};
use mcsd::config::Config;
use mcsd::error::exit_code_for;
use mcsd::{paths, preflight};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    HookBuilder::default().display_env_section(false).install()?;
    mcsd::subscriber::init_subscriber();

    let cli = Cli::parse();

    let docker = match preflight::check().await {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let install_root = paths::resolve_install_root();
    let data_root = paths::resolve_data_root(&install_root);
    let config = Config::load(&data_root)?;

    let state = State { docker, config, install_root, data_root };

    if let Err(report) = cli.run(state).await {
        eprintln!("{report:?}");
        std::process::exit(exit_code_for(&report));
    }

    Ok(())
}
