//! Install-root and data-root resolution.
//!
//! An install root is where read-only assets (`dockerfiles/`, embedded
//! installer scripts) live; the data root is where per-user mutable state
//! (config, ports, codespaces) lives. They default to the same directory.

use std::path::{Path, PathBuf};

const TOOL_DIR: &str = ".mcsd";

fn standard_locations() -> Vec<PathBuf> {
    let mut locations = vec![
        PathBuf::from("/usr/local/share/mcsd"),
        PathBuf::from("/opt/mcsd"),
    ];
    if let Some(home) = dirs_home() {
        locations.push(home.join(TOOL_DIR));
        locations.push(home.join(".local/share/mcsd"));
    }
    locations
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn has_dockerfiles(dir: &Path) -> bool {
    dir.join("dockerfiles").is_dir()
}

/// Resolve the install root per spec: cwd, then standard locations, then
/// `INSTALL_PATH`, then `$HOME/.mcsd`.
pub fn resolve_install_root() -> PathBuf {
    if let Ok(cwd) = std::env::current_dir() {
        if has_dockerfiles(&cwd) {
            return cwd;
        }
    }

    for candidate in standard_locations() {
        if has_dockerfiles(&candidate) {
            return candidate;
        }
    }

    if let Some(path) = std::env::var_os("INSTALL_PATH") {
        return PathBuf::from(path);
    }

    dirs_home()
        .map(|h| h.join(TOOL_DIR))
        .unwrap_or_else(|| PathBuf::from(TOOL_DIR))
}

/// Resolve the data root: `MCSD_DATA_ROOT` override, else the install root.
pub fn resolve_data_root(install_root: &Path) -> PathBuf {
    std::env::var_os("MCSD_DATA_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| install_root.to_path_buf())
}

pub fn dockerfiles_dir(install_root: &Path) -> PathBuf {
    install_root.join("dockerfiles")
}

pub fn codespaces_dir(data_root: &Path) -> PathBuf {
    data_root.join("codespaces")
}

pub fn codespace_dir(data_root: &Path, name: &str) -> PathBuf {
    codespaces_dir(data_root).join(name)
}

pub fn config_path(data_root: &Path) -> PathBuf {
    data_root.join("config.json")
}

pub fn ports_path(data_root: &Path) -> PathBuf {
    data_root.join("ports.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_home_dot_dir_without_install_path() {
        // We can't unset HOME safely in a parallel test run, so just check
        // the shape of the fallback path.
        let root = dirs_home().map(|h| h.join(TOOL_DIR));
        if let Some(root) = root {
            assert!(root.ends_with(TOOL_DIR));
        }
    }

    #[test]
    fn dockerfiles_dir_is_install_root_child() {
        let root = PathBuf::from("/tmp/install");
        assert_eq!(dockerfiles_dir(&root), PathBuf::from("/tmp/install/dockerfiles"));
    }
}
