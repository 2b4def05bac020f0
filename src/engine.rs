//! Codespace Manager: the user-facing operations, coordinating A–I
//! (spec §4.J).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bollard::Docker;
use rand::Rng;

use crate::components::{self, ComponentId};
use crate::compose_gen::{self, ComposeSpec, PortMapping};
use crate::config::Config;
use crate::detect::{self, Language};
use crate::error::EngineError;
use crate::image;
use crate::metadata::{Codespace, CodespaceView, ContainerStatus};
use crate::orchestrator::{self, ContainerState};
use crate::ports::PortRegistry;
use crate::selection::SelectionProvider;
use crate::{clone, paths};

/// Whimsical suffix words for name collisions (spec §8 S2). Closed list, in
/// a fixed order so suffix selection only depends on the random index.
const ADJECTIVES: &[&str] = &["happy", "brave", "quiet", "clever", "sunny", "lucky", "gentle", "swift"];
const NOUNS: &[&str] = &["narwhal", "otter", "falcon", "panda", "heron", "lynx", "badger", "marmot"];

pub struct CreateOptions {
    pub repository: String,
    pub no_start: bool,
    pub depth: clone::Depth,
    pub language_override: Option<Language>,
    pub image_override: Option<String>,
    pub ports_override: Option<Vec<PortMapping>>,
    pub force: bool,
    pub github_token: Option<String>,
    pub env_file: Option<PathBuf>,
}

pub struct Engine<'a> {
    pub docker: &'a Docker,
    pub data_root: PathBuf,
    pub install_root: PathBuf,
    pub config: &'a Config,
    pub ports: PortRegistry,
}

impl<'a> Engine<'a> {
    pub fn new(docker: &'a Docker, install_root: PathBuf, data_root: PathBuf, config: &'a Config) -> eyre::Result<Self> {
        let ports = PortRegistry::open(&data_root)?;
        Ok(Engine { docker, data_root, install_root, config, ports })
    }

    /// `Create(options)`: spec §4.J's ordered pipeline with an exhaustive
    /// rollback chain on every failure branch.
    pub async fn create(
        &self,
        options: CreateOptions,
        selector: &dyn SelectionProvider,
        progress: Option<&clone::ProgressFn>,
    ) -> eyre::Result<Codespace> {
        let repo = clone::RepoRef::parse(&options.repository)?;
        let name = self.derive_name(&repo.owner, &repo.repo, options.force)?;
        let codespace_dir = paths::codespace_dir(&self.data_root, &name);

        if codespace_dir.exists() {
            if options.force {
                self.remove(&name, true).await.ok();
            } else {
                return Err(EngineError::AlreadyExists(format!("codespace {name} already exists")).into());
            }
        }

        // Directory layout.
        for child in ["src", "data", "config", "logs", ".mcs"] {
            std::fs::create_dir_all(codespace_dir.join(child))?;
        }

        // Clone.
        let src_dir = codespace_dir.join("src");
        if let Err(e) = clone::clone(&repo, &src_dir, options.depth, options.github_token.as_deref(), progress).await {
            let _ = std::fs::remove_dir_all(&codespace_dir);
            return Err(e);
        }

        let language = options.language_override.unwrap_or_else(|| detect::detect_language(&src_dir));

        let selection: BTreeSet<ComponentId> = match selector.provide_selection() {
            Ok(s) => s,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&codespace_dir);
                return Err(e);
            }
        };

        // Ports (rollback: remove directory).
        let allocated_ports = match &options.ports_override {
            Some(_) => None,
            None => match self.ports.allocate_codespace(&name).await {
                Ok(p) => Some(p),
                Err(e) => {
                    let _ = std::fs::remove_dir_all(&codespace_dir);
                    return Err(e);
                }
            },
        };

        let component_names: Vec<String> = selection.iter().map(|id| id.id().to_string()).collect();
        let descriptor = image::resolve(&self.install_root, language, &component_names);
        let checksum = image::checksum_for(&descriptor);
        let image_tag = options.image_override.clone().unwrap_or_else(|| descriptor.image_tag.clone());

        let ports: Vec<PortMapping> = if let Some(explicit) = &options.ports_override {
            explicit.clone()
        } else {
            let p = allocated_ports.expect("allocated when no override given");
            vec![
                PortMapping { host: p.vscode, container: 8080 },
                PortMapping { host: p.app, container: 3000 },
            ]
        };

        let password = generate_password();

        let extra_env = match &options.env_file {
            Some(path) => match compose_gen::parse_env_file(path) {
                Ok(env) => env,
                Err(e) => {
                    self.ports.release_codespace(&name).ok();
                    let _ = std::fs::remove_dir_all(&codespace_dir);
                    return Err(e);
                }
            },
            None => Vec::new(),
        };

        let spec = ComposeSpec {
            container_name: compose_gen::container_name(&name),
            image: image::ImageDescriptor { image_tag, ..descriptor },
            ports: ports.clone(),
            codespace_name: name.clone(),
            repo_url: repo.url.clone(),
            password: password.clone(),
            language: language.as_str().to_string(),
            extra_env,
        };

        // Compose + env (rollback: release ports, remove directory).
        if let Err(e) = compose_gen::write_compose(&codespace_dir, &spec) {
            self.ports.release_codespace(&name).ok();
            let _ = std::fs::remove_dir_all(&codespace_dir);
            return Err(e);
        }

        // Component staging (same rollback).
        if let Err(e) = components::stage(&codespace_dir, &selection) {
            self.ports.release_codespace(&name).ok();
            let _ = std::fs::remove_dir_all(&codespace_dir);
            return Err(e);
        }

        orchestrator::ensure_network(self.docker).await?;

        let host_ip = &self.config.host_ip;
        let codespace = Codespace {
            name: name.clone(),
            repository: repo.url.clone(),
            path: codespace_dir.clone(),
            created_at: jiff::Zoned::now().strftime("%Y-%m-%dT%H:%M:%SZ").to_string(),
            vscode_url: format!("http://{host_ip}:{}", ports[0].host),
            app_url: format!("http://{host_ip}:{}", ports.get(1).map(|p| p.host).unwrap_or(0)),
            components: component_names,
            language,
            password,
            dockerfile_checksum: checksum,
        };
        codespace.write(&codespace_dir)?;

        if !options.no_start {
            orchestrator::ComposeExecutor::up(&codespace_dir).await?;
        }

        Ok(codespace)
    }

    fn derive_name(&self, owner: &str, repo: &str, force: bool) -> eyre::Result<String> {
        let base = sanitize_name(&format!("{owner}-{repo}"));
        let candidate_dir = paths::codespace_dir(&self.data_root, &base);
        if !candidate_dir.exists() || force {
            return Ok(base);
        }

        for _ in 0..64 {
            let adjective = ADJECTIVES[rand::rng().random_range(0..ADJECTIVES.len())];
            let noun = NOUNS[rand::rng().random_range(0..NOUNS.len())];
            let candidate = format!("{base}-{adjective}-{noun}");
            if !paths::codespace_dir(&self.data_root, &candidate).exists() {
                return Ok(candidate);
            }
        }
        Err(EngineError::Internal("could not derive a unique codespace name".to_string()).into())
    }

    /// Cross-references the on-disk records against a single bulk,
    /// label-filtered container listing (spec §4.I) rather than inspecting
    /// each codespace's container individually.
    pub async fn list(&self) -> eyre::Result<Vec<CodespaceView>> {
        let codespaces = crate::metadata::list(&self.data_root)?;
        let containers = orchestrator::list_managed(self.docker).await.unwrap_or_default();

        let views = codespaces
            .into_iter()
            .map(|codespace| {
                let container = compose_gen::container_name(&codespace.name);
                let status = containers
                    .iter()
                    .find(|c| {
                        c.names
                            .as_ref()
                            .is_some_and(|names| names.iter().any(|n| n.trim_start_matches('/') == container))
                    })
                    .and_then(|c| c.state.as_deref())
                    .map(|s| if s == "running" { ContainerStatus::Running } else { ContainerStatus::Stopped })
                    .unwrap_or(ContainerStatus::Stopped);
                CodespaceView { codespace, status }
            })
            .collect();
        Ok(views)
    }

    pub async fn get(&self, name: &str) -> eyre::Result<CodespaceView> {
        let codespace = crate::metadata::get(&self.data_root, name)?;
        let status = self.status_for(name).await;
        Ok(CodespaceView { codespace, status })
    }

    async fn status_for(&self, name: &str) -> ContainerStatus {
        match orchestrator::container_state(self.docker, &compose_gen::container_name(name)).await {
            Ok(ContainerState::Running) => ContainerStatus::Running,
            _ => ContainerStatus::Stopped,
        }
    }

    /// `Start(name)`: brings up an absent container, or resumes a stopped
    /// one, with rebuild detection per §4.G.
    pub async fn start(&self, name: &str, confirm_rebuild: impl Fn() -> bool) -> eyre::Result<()> {
        let mut codespace = crate::metadata::get(&self.data_root, name)?;
        let codespace_dir = paths::codespace_dir(&self.data_root, name);
        let container = compose_gen::container_name(name);

        let state = orchestrator::container_state(self.docker, &container).await?;
        if state == ContainerState::Absent {
            orchestrator::ComposeExecutor::up(&codespace_dir).await?;
            return Ok(());
        }

        if !codespace.dockerfile_checksum.is_empty() {
            let descriptor = image::resolve(&self.install_root, codespace.language, &codespace.components);
            let current = image::checksum_for(&descriptor);
            if !current.is_empty() && current != codespace.dockerfile_checksum && confirm_rebuild() {
                orchestrator::ComposeExecutor::build(&codespace_dir).await?;
                if state == ContainerState::Running {
                    orchestrator::stop(self.docker, &container).await?;
                }
                orchestrator::remove(self.docker, &container, true).await?;
                orchestrator::ComposeExecutor::up(&codespace_dir).await?;
                codespace.dockerfile_checksum = current;
                codespace.write(&codespace_dir)?;
                return Ok(());
            }
        }

        if state == ContainerState::Stopped {
            self.docker
                .start_container(&container, None::<bollard::query_parameters::StartContainerOptions>)
                .await
                .map_err(|e| EngineError::RuntimeUnavailable(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn stop(&self, name: &str) -> eyre::Result<()> {
        crate::metadata::get(&self.data_root, name)?;
        orchestrator::stop(self.docker, &compose_gen::container_name(name)).await
    }

    /// `Remove(name, force)`: idempotent per step (spec §7). Port release
    /// runs even if container removal failed, because ports are a separate
    /// invariant (§4.G).
    pub async fn remove(&self, name: &str, force: bool) -> eyre::Result<()> {
        let codespace_dir = paths::codespace_dir(&self.data_root, name);
        let container = compose_gen::container_name(name);

        let remove_result = orchestrator::remove(self.docker, &container, force).await;
        self.ports.release_codespace(name).ok();

        remove_result?;

        if codespace_dir.exists() {
            std::fs::remove_dir_all(&codespace_dir)?;
        }
        Ok(())
    }

    pub async fn logs(
        &self,
        name: &str,
        follow: bool,
    ) -> eyre::Result<impl futures::Stream<Item = eyre::Result<String>>> {
        crate::metadata::get(&self.data_root, name)?;
        orchestrator::logs(self.docker, &compose_gen::container_name(name), follow).await
    }
}

fn sanitize_name(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// 16 hex characters from a cryptographically secure source (spec §8
/// testable property 6). Generated exactly once, at creation (invariant 3).
pub fn generate_password() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_password_is_16_hex_chars() {
        let p = generate_password();
        assert_eq!(p.len(), 16);
        assert!(p.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_password_is_not_constant() {
        assert_ne!(generate_password(), generate_password());
    }

    #[test]
    fn sanitize_name_lowercases_and_strips_invalid_chars() {
        assert_eq!(sanitize_name("Facebook/React"), "facebook-react");
    }
}
