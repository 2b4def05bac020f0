use std::collections::BTreeSet;

use clap::Args;

use crate::ansi::{GREEN, RESET};
use crate::cli::State;
use crate::clone::Depth;
use crate::compose_gen::PortMapping;
use crate::detect::Language;
use crate::engine::{CreateOptions, Engine};
use crate::error::EngineError;
use crate::selection::{ScriptedSelector, SelectionProvider, UnimplementedSelector};

/// Create a new codespace from a repository reference
#[derive(Debug, Args)]
pub struct Create {
    /// git@host:owner/repo, https://host/owner/repo, owner/repo, or a local path
    repository: String,

    #[arg(long)]
    no_start: bool,

    #[arg(long)]
    skip_selector: bool,

    #[arg(long, default_value_t = 0)]
    depth: i64,

    #[arg(long)]
    language: Option<String>,

    #[arg(long)]
    image: Option<String>,

    /// "host:container,host:container,..."
    #[arg(long)]
    ports: Option<String>,

    /// path to a KEY=VALUE-per-line file merged into the codespace's .env
    /// and container environment
    #[arg(long)]
    env_file: Option<String>,

    #[arg(long)]
    force: bool,
}

impl Create {
    pub async fn run(self, state: State) -> eyre::Result<()> {
        let engine = Engine::new(&state.docker, state.install_root.clone(), state.data_root.clone(), &state.config)?;

        let language_override = match self.language {
            Some(ref l) => Some(parse_language(l)?),
            None => None,
        };

        let ports_override = match self.ports {
            Some(ref s) => Some(parse_ports(s)?),
            None => None,
        };

        let options = CreateOptions {
            repository: self.repository,
            no_start: self.no_start,
            depth: Depth::from_arg(self.depth),
            language_override,
            image_override: self.image,
            ports_override,
            force: self.force,
            github_token: state.config.github_token.clone(),
            env_file: self.env_file.map(std::path::PathBuf::from),
        };

        let selector: Box<dyn SelectionProvider> = if self.skip_selector {
            Box::new(ScriptedSelector(BTreeSet::new()))
        } else {
            Box::new(UnimplementedSelector)
        };

        let codespace = engine
            .create(
                options,
                selector.as_ref(),
                Some(&(Box::new(|line: &str| eprintln!("{line}")) as crate::clone::ProgressFn)),
            )
            .await?;

        println!("{GREEN}Created{RESET} {}", codespace.name);
        println!("  editor: {}", codespace.vscode_url);
        println!("  app:    {}", codespace.app_url);
        Ok(())
    }
}

fn parse_language(s: &str) -> eyre::Result<Language> {
    match s {
        "python" => Ok(Language::Python),
        "node" => Ok(Language::Node),
        "go" => Ok(Language::Go),
        "rust" => Ok(Language::Rust),
        "java" => Ok(Language::Java),
        "php" => Ok(Language::Php),
        "ruby" => Ok(Language::Ruby),
        "dotnet" => Ok(Language::Dotnet),
        "generic" => Ok(Language::Generic),
        other => Err(EngineError::InvalidInput(format!("unknown language: {other}")).into()),
    }
}

fn parse_ports(spec: &str) -> eyre::Result<Vec<PortMapping>> {
    spec.split(',')
        .map(|pair| {
            let (host, container) = pair
                .split_once(':')
                .ok_or_else(|| EngineError::InvalidInput(format!("invalid port mapping: {pair}")))?;
            let host = host
                .parse()
                .map_err(|_| EngineError::InvalidInput(format!("invalid host port: {host}")))?;
            let container = container
                .parse()
                .map_err(|_| EngineError::InvalidInput(format!("invalid container port: {container}")))?;
            Ok(PortMapping { host, container })
        })
        .collect()
}
