//! Port allocation registry: `<data-root>/ports.json`.
//!
//! A process-wide mutex-guarded map, persisted atomically after every
//! mutation. Not safe across processes sharing a data root (spec §5).

use std::collections::BTreeMap;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::write_atomic_0600;
use crate::error::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortEntry {
    pub codespace: String,
    pub service: String,
    pub allocated_at: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(flatten)]
    entries: BTreeMap<u16, PortEntry>,
}

/// A port range, inclusive on both ends.
#[derive(Debug, Clone, Copy)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    fn len(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }
}

/// Resolve the allocation range for a named service, per spec §3.
pub fn service_range(service: &str) -> PortRange {
    match service {
        "vscode" => PortRange { start: 8080, end: 8099 },
        "app" => PortRange { start: 3000, end: 3099 },
        "api" => PortRange { start: 5000, end: 5099 },
        "db" => PortRange { start: 5432, end: 5532 },
        _ => PortRange { start: 10_000, end: 20_000 },
    }
}

pub struct PortRegistry {
    path: PathBuf,
    inner: Mutex<RegistryFile>,
}

impl PortRegistry {
    /// Open (or initialize) the registry at `<data_root>/ports.json`.
    pub fn open(data_root: &Path) -> eyre::Result<Self> {
        let path = crate::paths::ports_path(data_root);
        let file = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Ok(PortRegistry {
            path,
            inner: Mutex::new(file),
        })
    }

    fn persist(&self, guard: &RegistryFile) -> eyre::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic_0600(&self.path, &serde_json::to_vec_pretty(guard)?)?;
        Ok(())
    }

    /// Allocate a single port for `(codespace, service)`.
    ///
    /// Picks a uniformly random starting offset within the service's range
    /// and walks it in one wrap-around pass, skipping ports already
    /// registered or that fail an OS-level bind probe.
    pub async fn allocate(&self, codespace: &str, service: &str) -> eyre::Result<u16> {
        let range = service_range(service);
        let len = range.len();
        let offset = fastrand::u32(..len);

        for i in 0..len {
            let port = range.start + ((offset + i) % len) as u16;

            let already_taken = {
                let guard = self.inner.lock().unwrap();
                guard.entries.contains_key(&port)
            };
            if already_taken {
                continue;
            }

            if !probe_port_free(port).await {
                continue;
            }

            let mut guard = self.inner.lock().unwrap();
            // Re-check under the lock: another allocation may have raced us
            // between the probe and taking the lock.
            if guard.entries.contains_key(&port) {
                continue;
            }
            guard.entries.insert(
                port,
                PortEntry {
                    codespace: codespace.to_string(),
                    service: service.to_string(),
                    allocated_at: jiff::Timestamp::now().as_second(),
                },
            );
            self.persist(&guard)?;
            return Ok(port);
        }

        Err(EngineError::NoPortsAvailable(service.to_string()).into())
    }

    /// Allocate `vscode` then `app` for a codespace, rolling back the first
    /// allocation if the second fails.
    pub async fn allocate_codespace(&self, codespace: &str) -> eyre::Result<CodespacePorts> {
        let vscode = self.allocate(codespace, "vscode").await?;
        let app = match self.allocate(codespace, "app").await {
            Ok(p) => p,
            Err(e) => {
                self.release(vscode)?;
                return Err(e);
            }
        };
        Ok(CodespacePorts { vscode, app })
    }

    pub fn release(&self, port: u16) -> eyre::Result<()> {
        let mut guard = self.inner.lock().unwrap();
        guard.entries.remove(&port);
        self.persist(&guard)
    }

    /// Release every port entry referencing `codespace`. Best-effort:
    /// absence of entries is not an error (spec §7).
    pub fn release_codespace(&self, codespace: &str) -> eyre::Result<()> {
        let mut guard = self.inner.lock().unwrap();
        guard.entries.retain(|_, entry| entry.codespace != codespace);
        self.persist(&guard)
    }

    pub fn entries(&self) -> Vec<(u16, PortEntry)> {
        let guard = self.inner.lock().unwrap();
        guard.entries.iter().map(|(p, e)| (*p, e.clone())).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CodespacePorts {
    pub vscode: u16,
    pub app: u16,
}

async fn probe_port_free(port: u16) -> bool {
    tokio::task::spawn_blocking(move || TcpListener::bind(("0.0.0.0", port)).is_ok())
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn allocates_within_range() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = PortRegistry::open(tmp.path()).unwrap();
        let port = registry.allocate("cs1", "vscode").await.unwrap();
        let range = service_range("vscode");
        assert!(port >= range.start && port <= range.end);
    }

    #[tokio::test]
    #[serial]
    async fn allocate_codespace_is_transactional_on_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = PortRegistry::open(tmp.path()).unwrap();

        // Saturate `app` so the second half of allocate_codespace fails.
        let app_range = service_range("app");
        for port in app_range.start..=app_range.end {
            let mut guard = registry.inner.lock().unwrap();
            guard.entries.insert(
                port,
                PortEntry {
                    codespace: "other".into(),
                    service: "app".into(),
                    allocated_at: 0,
                },
            );
        }
        registry.persist(&registry.inner.lock().unwrap()).unwrap();

        let result = registry.allocate_codespace("cs2").await;
        assert!(result.is_err());
        assert!(registry.entries().iter().all(|(_, e)| e.codespace != "cs2"));
    }

    #[tokio::test]
    #[serial]
    async fn exhausted_range_returns_no_ports_available() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = PortRegistry::open(tmp.path()).unwrap();
        let range = service_range("vscode");
        for port in range.start..=range.end {
            let mut guard = registry.inner.lock().unwrap();
            guard.entries.insert(
                port,
                PortEntry {
                    codespace: "x".into(),
                    service: "vscode".into(),
                    allocated_at: 0,
                },
            );
        }
        let before = registry.entries().len();
        let result = registry.allocate("cs3", "vscode").await;
        assert!(result.is_err());
        assert_eq!(registry.entries().len(), before);
    }

    #[tokio::test]
    #[serial]
    async fn release_codespace_removes_all_its_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = PortRegistry::open(tmp.path()).unwrap();
        let ports = registry.allocate_codespace("cs4").await.unwrap();
        registry.release_codespace("cs4").unwrap();
        let entries = registry.entries();
        assert!(entries.iter().all(|(p, _)| *p != ports.vscode && *p != ports.app));
    }

    #[tokio::test]
    #[serial]
    async fn concurrent_allocations_yield_distinct_ports() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = std::sync::Arc::new(PortRegistry::open(tmp.path()).unwrap());
        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.allocate(&format!("cs-{i}"), "api").await.unwrap()
            }));
        }
        let mut ports = Vec::new();
        for h in handles {
            ports.push(h.await.unwrap());
        }
        let unique: std::collections::HashSet<_> = ports.iter().collect();
        assert_eq!(unique.len(), ports.len());
    }
}
