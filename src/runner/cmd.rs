use std::borrow::Cow;

use crate::runner::{Runnable, stream_command};

/// A shell-parsed or explicit-argv command, as written into `.env`-adjacent
/// scripts and run through [`Runner`](crate::runner::Runner).
#[derive(Debug, Clone)]
pub enum Cmd {
    Shell(String),
    Args(Vec<String>),
}

impl Cmd {
    pub fn as_args(&self) -> Vec<&str> {
        match self {
            Cmd::Shell(prog) => vec!["/bin/sh", "-c", prog],
            Cmd::Args(args) => args.iter().map(|s| s.as_str()).collect(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cmd::Shell(prog) => prog.clone(),
            Cmd::Args(args) => args.join(" "),
        }
    }
}

pub struct NamedCmd {
    pub label: String,
    pub cmd: Cmd,
    pub dir: Option<std::path::PathBuf>,
}

impl Runnable for NamedCmd {
    fn name(&self) -> Cow<'_, str> {
        self.label.as_str().into()
    }

    fn description(&self) -> Cow<'_, str> {
        self.cmd.display().into()
    }

    async fn run(self) -> eyre::Result<()> {
        let argv = self.cmd.as_args();
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| eyre::eyre!("empty command"))?;
        stream_command(
            program,
            &args.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            self.dir.as_deref(),
            |line| tracing::info!(target: "mcsd::runner", "{line}"),
        )
        .await
    }
}
