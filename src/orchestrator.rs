//! Container orchestration: the low-level runtime client plus the compose
//! executor (spec §4.G).

use std::collections::HashMap;
use std::path::Path;

use bollard::Docker;
use bollard::query_parameters::{
    CreateNetworkOptions, InspectContainerOptions, ListContainersOptions, LogsOptions,
    RemoveContainerOptions, StopContainerOptions,
};
use bollard::secret::ContainerStateStatusEnum;
use futures::StreamExt;

use crate::error::EngineError;
use crate::runner::Runner;
use crate::runner::cmd::{Cmd, NamedCmd};

pub const MANAGED_LABEL: &str = "managed=true";
pub const NETWORK_NAME: &str = "mcsd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Absent,
    Running,
    Stopped,
}

/// Inspect a container by name. `Absent` covers both "no such container" and
/// a runtime that can't be reached (§4.I status degrades to `stopped`, but
/// the orchestrator itself distinguishes the two for callers that care).
pub async fn container_state(docker: &Docker, name: &str) -> eyre::Result<ContainerState> {
    match docker
        .inspect_container(name, None::<InspectContainerOptions>)
        .await
    {
        Ok(info) => {
            let running = info
                .state
                .and_then(|s| s.status)
                .is_some_and(|s| s == ContainerStateStatusEnum::RUNNING);
            Ok(if running { ContainerState::Running } else { ContainerState::Stopped })
        }
        Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
            Ok(ContainerState::Absent)
        }
        Err(e) => Err(EngineError::RuntimeUnavailable(e.to_string()).into()),
    }
}

pub async fn list_managed(docker: &Docker) -> eyre::Result<Vec<bollard::secret::ContainerSummary>> {
    let mut filters = HashMap::new();
    filters.insert("label".to_string(), vec![MANAGED_LABEL.to_string()]);
    docker
        .list_containers(Some(ListContainersOptions { all: true, filters: Some(filters), ..Default::default() }))
        .await
        .map_err(|e| EngineError::RuntimeUnavailable(e.to_string()).into())
}

pub async fn stop(docker: &Docker, name: &str) -> eyre::Result<()> {
    docker
        .stop_container(name, None::<StopContainerOptions>)
        .await
        .map_err(|e| EngineError::RuntimeUnavailable(e.to_string()))?;
    Ok(())
}

/// Remove a container. Refuses a running container unless `force` (spec
/// §4.G). Missing container is not an error (remove is idempotent, §7).
pub async fn remove(docker: &Docker, name: &str, force: bool) -> eyre::Result<()> {
    let state = container_state(docker, name).await?;
    if state == ContainerState::Absent {
        return Ok(());
    }
    if state == ContainerState::Running && !force {
        return Err(EngineError::InvalidInput(format!(
            "container {name} is running; pass --force to remove it"
        ))
        .into());
    }
    docker
        .remove_container(name, Some(RemoveContainerOptions { force: true, ..Default::default() }))
        .await
        .map_err(|e| EngineError::RuntimeUnavailable(e.to_string()))?;
    Ok(())
}

/// Stream logs for `name`. Returns every line already produced; when
/// `follow` is set, the stream stays open as the container emits more.
/// (§9 open question: the source placeholder must become a real stream.)
pub async fn logs(
    docker: &Docker,
    name: &str,
    follow: bool,
) -> eyre::Result<impl futures::Stream<Item = eyre::Result<String>>> {
    let options = LogsOptions {
        follow,
        stdout: true,
        stderr: true,
        tail: "all".to_string(),
        ..Default::default()
    };
    let stream = docker.logs(name, Some(options)).map(|chunk| {
        chunk
            .map(|c| c.to_string())
            .map_err(|e| EngineError::RuntimeUnavailable(e.to_string()).into())
    });
    Ok(stream)
}

/// Ensure the shared bridge network exists; a no-op if it's already there.
pub async fn ensure_network(docker: &Docker) -> eyre::Result<()> {
    let exists = docker
        .list_networks(None::<bollard::query_parameters::ListNetworksOptions>)
        .await
        .map_err(|e| EngineError::RuntimeUnavailable(e.to_string()))?
        .into_iter()
        .any(|n| n.name.as_deref() == Some(NETWORK_NAME));
    if exists {
        return Ok(());
    }
    docker
        .create_network(CreateNetworkOptions { name: NETWORK_NAME.to_string(), ..Default::default() })
        .await
        .map_err(|e| EngineError::RuntimeUnavailable(e.to_string()))?;
    Ok(())
}

/// Shells out to `docker compose`, mirroring the teacher's own
/// `cli/up.rs::compose_up` rather than talking compose over the bollard
/// socket (compose has no stable Engine API equivalent).
pub struct ComposeExecutor;

impl ComposeExecutor {
    pub async fn up(codespace_dir: &Path) -> eyre::Result<()> {
        Self::run(codespace_dir, &["up", "-d"]).await
    }

    pub async fn build(codespace_dir: &Path) -> eyre::Result<()> {
        Self::run(codespace_dir, &["build"]).await
    }

    pub async fn down(codespace_dir: &Path) -> eyre::Result<()> {
        Self::run(codespace_dir, &["down", "--remove-orphans"]).await
    }

    async fn run(codespace_dir: &Path, args: &[&str]) -> eyre::Result<()> {
        let argv: Vec<String> = std::iter::once("docker".to_string())
            .chain(std::iter::once("compose".to_string()))
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cmd = NamedCmd {
            label: "compose".to_string(),
            cmd: Cmd::Args(argv),
            dir: Some(codespace_dir.to_path_buf()),
        };
        Runner::run("compose", cmd)
            .await
            .map_err(|e| EngineError::BuildFailed(e.to_string()).into())
    }
}
