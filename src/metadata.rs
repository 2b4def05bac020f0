//! Per-codespace metadata store: `<codespace>/.mcs/metadata.json` (spec §3 / §4.I).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::write_atomic_0600;
use crate::detect::Language;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Stopped,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Running => "running",
            ContainerStatus::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Codespace {
    pub name: String,
    pub repository: String,
    pub path: PathBuf,
    pub created_at: String,
    pub vscode_url: String,
    pub app_url: String,
    pub components: Vec<String>,
    pub language: Language,
    pub password: String,
    pub dockerfile_checksum: String,
}

/// A codespace record enriched with live container status, as returned by
/// `list`/`get` (spec §4.I). Status degrades to `Stopped` when the runtime
/// is unreachable.
#[derive(Debug, Clone)]
pub struct CodespaceView {
    pub codespace: Codespace,
    pub status: ContainerStatus,
}

fn metadata_path(codespace_dir: &Path) -> PathBuf {
    codespace_dir.join(".mcs").join("metadata.json")
}

impl Codespace {
    pub fn write(&self, codespace_dir: &Path) -> eyre::Result<()> {
        let path = metadata_path(codespace_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic_0600(&path, &serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn read(codespace_dir: &Path) -> eyre::Result<Self> {
        let path = metadata_path(codespace_dir);
        let contents = std::fs::read_to_string(&path).map_err(|_| {
            EngineError::NotFound(format!("no metadata at {}", path.display()))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// List every codespace directory under `<data_root>/codespaces/` that
/// carries a metadata file. Directories without one are ignored (spec
/// invariant 2).
pub fn list(data_root: &Path) -> eyre::Result<Vec<Codespace>> {
    let dir = crate::paths::codespaces_dir(data_root);
    let mut result = Vec::new();
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Ok(result);
    };
    for entry in entries.filter_map(Result::ok) {
        if !entry.file_type().is_ok_and(|ft| ft.is_dir()) {
            continue;
        }
        if let Ok(codespace) = Codespace::read(&entry.path()) {
            result.push(codespace);
        }
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

pub fn get(data_root: &Path, name: &str) -> eyre::Result<Codespace> {
    let dir = crate::paths::codespace_dir(data_root, name);
    Codespace::read(&dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, dir: &Path) -> Codespace {
        Codespace {
            name: name.to_string(),
            repository: "https://github.com/o/r".to_string(),
            path: dir.to_path_buf(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            vscode_url: "http://127.0.0.1:8080".to_string(),
            app_url: "http://127.0.0.1:3000".to_string(),
            components: vec![],
            language: Language::Node,
            password: "0123456789abcdef".to_string(),
            dockerfile_checksum: String::new(),
        }
    }

    #[test]
    fn name_matches_directory_basename_after_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let cs_dir = tmp.path().join("codespaces").join("o-r");
        std::fs::create_dir_all(&cs_dir).unwrap();
        sample("o-r", &cs_dir).write(&cs_dir).unwrap();

        let loaded = get(tmp.path(), "o-r").unwrap();
        assert_eq!(loaded.name, "o-r");
    }

    #[test]
    fn list_skips_directories_without_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let codespaces = tmp.path().join("codespaces");
        std::fs::create_dir_all(codespaces.join("no-metadata")).unwrap();
        let with_meta = codespaces.join("has-meta");
        std::fs::create_dir_all(&with_meta).unwrap();
        sample("has-meta", &with_meta).write(&with_meta).unwrap();

        let all = list(tmp.path()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "has-meta");
    }

    #[test]
    fn get_missing_codespace_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(get(tmp.path(), "nope").is_err());
    }
}
