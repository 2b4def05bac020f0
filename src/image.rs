//! Image descriptor resolution: `(language, components) -> image descriptor`.
//!
//! Pure except for a single filesystem check (does the install root carry a
//! Dockerfile for this language) and, when it does, a hash of that
//! Dockerfile used later for rebuild detection (spec §4.G).

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::detect::Language;

#[derive(Debug, Clone)]
pub struct ImageDescriptor {
    pub image_tag: String,
    pub build_context: Option<std::path::PathBuf>,
    pub dockerfile: Option<std::path::PathBuf>,
}

const FALLBACK_IMAGE: &str = "codercom/code-server:latest";

/// Resolve an image descriptor. `components` only affects the tag suffix
/// (a distinct Dockerfile per component set is out of scope for this spec;
/// components are installed post-boot via the init script, §4.F).
pub fn resolve(install_root: &Path, language: Language, components: &[String]) -> ImageDescriptor {
    let dockerfile = install_root
        .join("dockerfiles")
        .join(language.as_str())
        .join("Dockerfile");

    let suffix = if components.is_empty() {
        String::new()
    } else {
        format!("-{}", components.join("-"))
    };
    let image_tag = format!("mcsd/{}{}:latest", language.as_str(), suffix);

    if dockerfile.is_file() {
        ImageDescriptor {
            image_tag,
            build_context: dockerfile.parent().map(Path::to_path_buf),
            dockerfile: Some(dockerfile),
        }
    } else {
        ImageDescriptor {
            image_tag: FALLBACK_IMAGE.to_string(),
            build_context: None,
            dockerfile: None,
        }
    }
}

/// Content hash of a Dockerfile, used to detect drift against a codespace's
/// recorded `dockerfile_checksum`. Empty string when there is no Dockerfile.
pub fn checksum_for(descriptor: &ImageDescriptor) -> String {
    let Some(path) = &descriptor.dockerfile else {
        return String::new();
    };
    match std::fs::read(path) {
        Ok(bytes) => {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            format!("{:x}", hasher.finalize())
        }
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_when_no_dockerfile_present() {
        let tmp = tempfile::tempdir().unwrap();
        let descriptor = resolve(tmp.path(), Language::Generic, &[]);
        assert!(descriptor.dockerfile.is_none());
        assert_eq!(checksum_for(&descriptor), "");
    }

    #[test]
    fn checksum_changes_with_content() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("dockerfiles").join("rust");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Dockerfile"), "FROM rust:1\n").unwrap();

        let d1 = resolve(tmp.path(), Language::Rust, &[]);
        let h1 = checksum_for(&d1);
        assert!(!h1.is_empty());

        std::fs::write(dir.join("Dockerfile"), "FROM rust:2\n").unwrap();
        let d2 = resolve(tmp.path(), Language::Rust, &[]);
        let h2 = checksum_for(&d2);
        assert_ne!(h1, h2);
    }

    #[test]
    fn unrecognized_language_resolves_to_generic() {
        let tmp = tempfile::tempdir().unwrap();
        let descriptor = resolve(tmp.path(), Language::Generic, &[]);
        assert_eq!(descriptor.image_tag, FALLBACK_IMAGE);
    }
}
