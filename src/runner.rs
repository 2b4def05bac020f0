//! Streaming subprocess runner: the worker-thread half of the suspension
//! points named in spec §5 (clone, compose invocations, installer staging).
//!
//! No pty is allocated here — every caller only needs line-buffered stdout/
//! stderr forwarding, not a controlling terminal. The one place that needs a
//! real terminal (`exec`) replaces the process outright via
//! `CommandExt::exec` instead of going through this module.

use std::borrow::Cow;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::Instrument;
use tracing::info_span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::ansi::{BLUE, MAGENTA, RESET};

pub mod cmd;

pub trait Runnable: Send {
    fn name(&self) -> Cow<'_, str>;
    fn description(&self) -> Cow<'_, str>;
    fn run(self) -> impl std::future::Future<Output = eyre::Result<()>> + Send;
}

pub struct Runner;

impl Runner {
    pub async fn run<R: Runnable>(label: &str, runnable: R) -> eyre::Result<()> {
        let description = runnable.description().into_owned();
        let span = info_span!(
            "run",
            label,
            indicatif.pb_show = true,
            message = format_args!("{BLUE}Running{RESET}: {description}")
        );
        span.pb_set_message(&format!("[{MAGENTA}{label}{RESET}] {BLUE}Running{RESET}: {description}"));
        runnable.run().instrument(span).await
    }

    pub async fn run_parallel<R: Runnable + 'static>(label: &str, runnables: Vec<R>) -> eyre::Result<()> {
        let futures: Vec<_> = runnables
            .into_iter()
            .map(|r| {
                let name = r.name().into_owned();
                let description = r.description().into_owned();
                let span = info_span!(
                    "parallel",
                    label = %name,
                    indicatif.pb_show = true,
                    message = format_args!("{BLUE}Running{RESET}: {description}")
                );
                span.pb_set_message(&format!("[{MAGENTA}{name}{RESET}] {BLUE}Running{RESET}: {description}"));
                r.run().instrument(span)
            })
            .collect();

        let results = futures::future::join_all(futures).await;
        if let Some(err) = results.into_iter().find_map(|r| r.err()) {
            return Err(err.wrap_err(format!("{label} failed")));
        }
        Ok(())
    }
}

/// Spawn `program`/`args` in `dir`, forwarding stdout/stderr line-by-line to
/// `on_line` as it's produced (the shape the progress callback in spec §4.D
/// and §5 needs). Returns an error if the process exits non-zero.
pub async fn stream_command(
    program: &str,
    args: &[String],
    dir: Option<&std::path::Path>,
    mut on_line: impl FnMut(&str) + Send,
) -> eyre::Result<()> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    command.stdout(std::process::Stdio::piped());
    command.stderr(std::process::Stdio::piped());

    let mut child = command.spawn()?;
    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();
    let mut stdout_done = false;
    let mut stderr_done = false;

    loop {
        if stdout_done && stderr_done {
            break;
        }
        tokio::select! {
            line = stdout_lines.next_line(), if !stdout_done => match line? {
                Some(line) => on_line(&line),
                None => stdout_done = true,
            },
            line = stderr_lines.next_line(), if !stderr_done => match line? {
                Some(line) => on_line(&line),
                None => stderr_done = true,
            },
        }
    }

    let status = child.wait().await?;
    eyre::ensure!(status.success(), "{program} exited with {status}");
    Ok(())
}
