use std::process::Stdio;

use bollard::Docker;
use eyre::bail;
use tokio::process::Command;

use crate::docker;

/// Verify the container runtime is reachable before the engine tries to use
/// it. Run once at startup (`main.rs`) and surfaced as `doctor` (spec §6).
pub async fn check() -> eyre::Result<Docker> {
    let docker = match docker::client() {
        Ok(d) => d,
        Err(_) => {
            bail!(
                "docker is not installed or the daemon is not running.\nInstall Docker: https://docs.docker.com/get-docker/"
            );
        }
    };

    if docker.version().await.is_err() {
        bail!(
            "docker is not installed or the daemon is not running.\nInstall Docker: https://docs.docker.com/get-docker/"
        );
    }

    if Command::new("docker")
        .args(["compose", "version", "--short"])
        .stderr(Stdio::null())
        .stdout(Stdio::null())
        .status()
        .await
        .map_or(true, |s| !s.success())
    {
        bail!(
            "docker compose (v2) is not available.\nInstall the Compose plugin: https://docs.docker.com/compose/install/"
        );
    }

    Ok(docker)
}

/// Non-fatal variant for the `doctor` verb: reports problems instead of
/// bailing, so the CLI can print a full diagnostic list.
pub struct Diagnosis {
    pub docker_running: bool,
    pub compose_available: bool,
}

pub async fn diagnose() -> Diagnosis {
    let docker_running = docker::client()
        .ok()
        .map(|d| async move { d.version().await.is_ok() });
    let docker_running = match docker_running {
        Some(fut) => fut.await,
        None => false,
    };

    let compose_available = Command::new("docker")
        .args(["compose", "version", "--short"])
        .stderr(Stdio::null())
        .stdout(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);

    Diagnosis { docker_running, compose_available }
}
