//! Language detection by marker file, per spec §4.E.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Node,
    Go,
    Rust,
    Java,
    Php,
    Ruby,
    Dotnet,
    Generic,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Node => "node",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Dotnet => "dotnet",
            Language::Generic => "generic",
        }
    }
}

/// Exact markers, in stable detection order, per spec §4.E.
const MARKERS: &[(Language, &[&str])] = &[
    (Language::Python, &["requirements.txt", "setup.py", "Pipfile", "pyproject.toml"]),
    (Language::Node, &["package.json", "yarn.lock", "package-lock.json"]),
    (Language::Go, &["go.mod", "go.sum"]),
    (Language::Rust, &["Cargo.toml", "Cargo.lock"]),
    (Language::Java, &["pom.xml", "build.gradle", "build.gradle.kts"]),
    (Language::Php, &["composer.json", "composer.lock"]),
    (Language::Ruby, &["Gemfile", "Gemfile.lock"]),
];

const DOTNET_GLOBS: &[&str] = &["*.csproj", "*.fsproj", "*.vbproj"];

const LIKELY_SUBDIRS: &[&str] = &["backend", "api", "server", "app", "src"];
const SUBDIR_GLOBS: &[&str] = &["*-go", "*-api", "*-backend", "services/*", "packages/*"];

fn detect_in_dir(dir: &Path) -> Option<Language> {
    for (lang, markers) in MARKERS {
        if markers.iter().any(|m| dir.join(m).is_file()) {
            return Some(*lang);
        }
    }
    for pattern in DOTNET_GLOBS {
        if glob_matches_any(dir, pattern) {
            return Some(Language::Dotnet);
        }
    }
    None
}

fn glob_matches_any(dir: &Path, pattern: &str) -> bool {
    let full = dir.join(pattern).to_string_lossy().into_owned();
    glob::glob(&full)
        .map(|mut paths| paths.any(|p| p.is_ok()))
        .unwrap_or(false)
}

fn candidate_subdirs(root: &Path) -> Vec<std::path::PathBuf> {
    let mut dirs: Vec<std::path::PathBuf> = LIKELY_SUBDIRS.iter().map(|s| root.join(s)).collect();

    for pattern in SUBDIR_GLOBS {
        let full = root.join(pattern).to_string_lossy().into_owned();
        if let Ok(paths) = glob::glob(&full) {
            dirs.extend(paths.filter_map(Result::ok).filter(|p| p.is_dir()));
        }
    }

    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.filter_map(Result::ok) {
            if entry.file_type().is_ok_and(|ft| ft.is_dir()) {
                dirs.push(entry.path());
            }
        }
    }

    dirs
}

/// Detect the primary language of a workspace: root markers first, then a
/// fixed list of likely subdirectories. Idempotent and order-stable
/// (spec §8 testable property 5).
pub fn detect_language(root: &Path) -> Language {
    if let Some(lang) = detect_in_dir(root) {
        return lang;
    }

    for dir in candidate_subdirs(root) {
        if let Some(lang) = detect_in_dir(&dir) {
            return lang;
        }
    }

    Language::Generic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_node_from_package_json() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("package.json"), "{}").unwrap();
        assert_eq!(detect_language(tmp.path()), Language::Node);
    }

    #[test]
    fn detects_rust_from_cargo_toml() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Cargo.toml"), "[package]").unwrap();
        assert_eq!(detect_language(tmp.path()), Language::Rust);
    }

    #[test]
    fn detects_in_subdirectory_when_root_has_no_markers() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = tmp.path().join("backend");
        std::fs::create_dir_all(&backend).unwrap();
        std::fs::write(backend.join("go.mod"), "module x").unwrap();
        assert_eq!(detect_language(tmp.path()), Language::Go);
    }

    #[test]
    fn falls_back_to_generic_with_no_markers() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(detect_language(tmp.path()), Language::Generic);
    }

    #[test]
    fn is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Gemfile"), "source x").unwrap();
        let first = detect_language(tmp.path());
        let second = detect_language(tmp.path());
        assert_eq!(first, second);
    }
}
