//! Compose specification + `.env` synthesis (spec §4.H).

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::image::ImageDescriptor;

/// A `host:container` port publication. Serializes as the `"host:container"`
/// string form docker-compose expects, the way `devcontainer/port_map.rs`
/// serializes its own `PortMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl Serialize for PortMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}:{}", self.host, self.container))
    }
}

impl<'de> Deserialize<'de> for PortMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let (host, container) = s
            .split_once(':')
            .ok_or_else(|| de::Error::invalid_value(Unexpected::Str(&s), &"\"host:container\""))?;
        let host = host
            .parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&s), &"a valid host port"))?;
        let container = container
            .parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&s), &"a valid container port"))?;
        Ok(PortMapping { host, container })
    }
}

/// Everything needed to write `docker-compose.yml` and `.env` for one
/// codespace (spec §4.H).
pub struct ComposeSpec {
    pub container_name: String,
    pub image: ImageDescriptor,
    pub ports: Vec<PortMapping>,
    pub codespace_name: String,
    pub repo_url: String,
    pub password: String,
    pub language: String,
    /// Extra `KEY=VALUE` pairs from `create --env-file`, merged into both
    /// the service environment and the generated `.env`.
    pub extra_env: Vec<(String, String)>,
}

/// Parse a `KEY=VALUE`-per-line env file, as accepted by `create --env-file`.
/// Blank lines and `#`-comments are skipped.
pub fn parse_env_file(path: &Path) -> eyre::Result<Vec<(String, String)>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('=').map(|(k, v)| (k.trim().to_string(), v.trim().to_string())))
        .collect())
}

const EDITOR_PORT: u16 = 8080;

pub fn write_compose(codespace_dir: &Path, spec: &ComposeSpec) -> eyre::Result<()> {
    let mut service = IndexMap::new();
    service.insert("container_name".to_string(), serde_yaml::to_value(&spec.container_name)?);

    if let (Some(context), Some(dockerfile)) = (&spec.image.build_context, &spec.image.dockerfile) {
        let mut build = IndexMap::new();
        build.insert("context".to_string(), context.to_string_lossy().to_string());
        build.insert("dockerfile".to_string(), dockerfile.to_string_lossy().to_string());
        service.insert("build".to_string(), serde_yaml::to_value(build)?);
    } else {
        service.insert("image".to_string(), serde_yaml::to_value(&spec.image.image_tag)?);
    }

    service.insert("ports".to_string(), serde_yaml::to_value(&spec.ports)?);

    let volumes = vec![
        format!("{}:/workspace/src", mount(codespace_dir, "src")),
        format!("{}:/home/coder/.local/share/code-server", mount(codespace_dir, "data")),
        format!("{}:/home/coder/.config", mount(codespace_dir, "config")),
        format!("{}:/var/log/mcsd", mount(codespace_dir, "logs")),
        format!("{}:/home/coder/.ssh:ro", shellexpand::tilde("~/.ssh")),
        format!("{}:/home/coder/.tokens:ro", mount(codespace_dir, "config/tokens")),
    ];
    service.insert("volumes".to_string(), serde_yaml::to_value(volumes)?);

    let labels = vec![
        "managed=true".to_string(),
        format!("repo={}", spec.repo_url),
        format!("created={}", jiff::Zoned::now().strftime("%Y-%m-%dT%H:%M:%SZ")),
        format!("language={}", spec.language),
    ];
    service.insert("labels".to_string(), serde_yaml::to_value(labels)?);

    let mut environment = IndexMap::new();
    environment.insert("CODESPACE_NAME".to_string(), spec.codespace_name.clone());
    environment.insert("REPO_URL".to_string(), spec.repo_url.clone());
    environment.insert("PASSWORD".to_string(), spec.password.clone());
    for (k, v) in &spec.extra_env {
        environment.insert(k.clone(), v.clone());
    }
    service.insert("environment".to_string(), serde_yaml::to_value(environment)?);

    let startup = format!(
        "git config --global user.name \"$(cat /home/coder/.config/git-name 2>/dev/null || echo mcsd)\" && \
         git config --global user.email \"$(cat /home/coder/.config/git-email 2>/dev/null || echo mcsd@localhost)\" && \
         exec code-server --bind-addr 0.0.0.0:{EDITOR_PORT} --auth password /workspace/src"
    );
    service.insert(
        "command".to_string(),
        serde_yaml::to_value(vec!["/bin/sh".to_string(), "-c".to_string(), startup])?,
    );

    let mut healthcheck = IndexMap::new();
    healthcheck.insert(
        "test".to_string(),
        serde_yaml::to_value(vec![
            "CMD".to_string(),
            "curl".to_string(),
            "-f".to_string(),
            format!("http://localhost:{EDITOR_PORT}/healthz"),
        ])?,
    );
    healthcheck.insert("interval".to_string(), serde_yaml::to_value("10s")?);
    healthcheck.insert("retries".to_string(), serde_yaml::to_value(5)?);
    service.insert("healthcheck".to_string(), serde_yaml::to_value(healthcheck)?);

    let mut services = IndexMap::new();
    services.insert("dev".to_string(), service);
    let mut document = IndexMap::new();
    document.insert("services".to_string(), services);

    let yaml = serde_yaml::to_string(&document)?;
    std::fs::write(codespace_dir.join("docker-compose.yml"), yaml)?;

    write_env(codespace_dir, spec)?;
    Ok(())
}

fn mount(codespace_dir: &Path, child: &str) -> String {
    codespace_dir.join(child).to_string_lossy().into_owned()
}

fn write_env(codespace_dir: &Path, spec: &ComposeSpec) -> eyre::Result<()> {
    let mut lines = vec![
        format!("CONTAINER_NAME={}", spec.container_name),
        format!("PASSWORD={}", spec.password),
        format!("IMAGE={}", spec.image.image_tag),
        format!("LANGUAGE={}", spec.language),
        format!("REPO_URL={}", spec.repo_url),
        format!("TZ={}", std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string())),
    ];
    for port in &spec.ports {
        lines.push(format!("PORT_{}={}", port.container, port.host));
    }
    for (k, v) in &spec.extra_env {
        lines.push(format!("{k}={v}"));
    }
    std::fs::write(codespace_dir.join(".env"), lines.join("\n") + "\n")?;
    Ok(())
}

pub fn container_name(codespace_name: &str) -> String {
    format!("{codespace_name}-dev")
}

/// Not part of the public surface of the generator, but `engine.rs` needs a
/// place to stash the codespace dir when assembling a `ComposeSpec` for
/// paths outside the struct.
pub fn compose_path(codespace_dir: &Path) -> PathBuf {
    codespace_dir.join("docker-compose.yml")
}

/// Rewrite the `PASSWORD` value in both `.env` and `docker-compose.yml`'s
/// service environment, for `reset-password` (spec §6).
pub fn set_password(codespace_dir: &Path, new_password: &str) -> eyre::Result<()> {
    let env_path = codespace_dir.join(".env");
    if let Ok(contents) = std::fs::read_to_string(&env_path) {
        let rewritten: String = contents
            .lines()
            .map(|line| {
                if line.starts_with("PASSWORD=") {
                    format!("PASSWORD={new_password}")
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&env_path, rewritten + "\n")?;
    }

    let compose_path = compose_path(codespace_dir);
    let contents = std::fs::read_to_string(&compose_path)?;
    let mut doc: serde_yaml::Value = serde_yaml::from_str(&contents)?;
    if let Some(password) = doc
        .get_mut("services")
        .and_then(|s| s.get_mut("dev"))
        .and_then(|s| s.get_mut("environment"))
        .and_then(|e| e.get_mut("PASSWORD"))
    {
        *password = serde_yaml::Value::String(new_password.to_string());
    }
    std::fs::write(&compose_path, serde_yaml::to_string(&doc)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_mapping_round_trips_through_yaml() {
        let pm = PortMapping { host: 8080, container: 8080 };
        let s = serde_yaml::to_string(&pm).unwrap();
        let back: PortMapping = serde_yaml::from_str(&s).unwrap();
        assert_eq!(pm, back);
    }

    #[test]
    fn container_name_has_dev_suffix() {
        assert_eq!(container_name("facebook-react"), "facebook-react-dev");
    }

    #[test]
    fn write_compose_produces_yaml_and_env() {
        let tmp = tempfile::tempdir().unwrap();
        let spec = ComposeSpec {
            container_name: "facebook-react-dev".to_string(),
            image: ImageDescriptor {
                image_tag: "mcsd/node:latest".to_string(),
                build_context: None,
                dockerfile: None,
            },
            ports: vec![PortMapping { host: 8080, container: 8080 }, PortMapping { host: 3000, container: 3000 }],
            codespace_name: "facebook-react".to_string(),
            repo_url: "https://github.com/facebook/react".to_string(),
            password: "0123456789abcdef".to_string(),
            language: "node".to_string(),
            extra_env: vec![("FOO".to_string(), "bar".to_string())],
        };
        write_compose(tmp.path(), &spec).unwrap();
        assert!(tmp.path().join("docker-compose.yml").is_file());
        let env = std::fs::read_to_string(tmp.path().join(".env")).unwrap();
        assert!(env.contains("PASSWORD=0123456789abcdef"));
        assert!(env.contains("PORT_8080=8080"));
        assert!(env.contains("FOO=bar"));
    }

    #[test]
    fn parse_env_file_skips_blanks_and_comments() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("extra.env");
        std::fs::write(&path, "# a comment\n\nFOO=bar\nBAZ=qux\n").unwrap();
        let parsed = parse_env_file(&path).unwrap();
        assert_eq!(parsed, vec![("FOO".to_string(), "bar".to_string()), ("BAZ".to_string(), "qux".to_string())]);
    }
}
