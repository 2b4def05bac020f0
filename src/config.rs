//! Per-user configuration: `<data-root>/config.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

const MIN_UPDATE_INTERVAL_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpMode {
    Localhost,
    Auto,
    Public,
    Custom,
}

impl IpMode {
    fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "localhost" => Ok(Self::Localhost),
            "auto" => Ok(Self::Auto),
            "public" => Ok(Self::Public),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::InvalidInput(format!(
                "unknown ip mode: {other} (expected one of localhost|auto|public|custom)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host_ip: String,
    pub ip_mode: IpMode,
    pub auto_detect_ip: bool,
    pub auto_update_enabled: bool,
    pub auto_update_check_interval: i64,
    pub last_update_check: i64,
    pub last_known_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Default for Config {
    fn default() -> Self {
        let now = now_unix();
        Config {
            host_ip: "127.0.0.1".to_string(),
            ip_mode: IpMode::Localhost,
            auto_detect_ip: false,
            auto_update_enabled: true,
            auto_update_check_interval: MIN_UPDATE_INTERVAL_SECS,
            last_update_check: 0,
            last_known_version: String::new(),
            github_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

fn now_unix() -> i64 {
    jiff::Timestamp::now().as_second()
}

impl Config {
    /// Load config from `<data_root>/config.json`, synthesizing and
    /// persisting defaults on a missing file or a parse failure.
    pub fn load(data_root: &Path) -> eyre::Result<Self> {
        let path = crate::paths::config_path(data_root);
        let loaded = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str::<Config>(&s).ok());

        let mut config = match loaded {
            Some(c) => c,
            None => {
                let mut c = Config::default();
                if let Some(token) = std::env::var_os("GITHUB_TOKEN") {
                    c.github_token = token.into_string().ok();
                }
                c.save(data_root)?;
                c
            }
        };

        if config.github_token.is_none() {
            if let Some(token) = std::env::var_os("GITHUB_TOKEN") {
                config.github_token = token.into_string().ok();
            }
        }

        Ok(config)
    }

    /// Atomically persist this config (write-to-temp, then rename), mode
    /// 0600. `updated_at` is bumped on every save.
    pub fn save(&mut self, data_root: &Path) -> eyre::Result<()> {
        self.updated_at = now_unix();
        let path = crate::paths::config_path(data_root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic_0600(&path, &serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn set_ip_mode(&mut self, mode: &str, data_root: &Path) -> eyre::Result<()> {
        self.ip_mode = IpMode::parse(mode)?;
        self.save(data_root)
    }

    pub fn set_update_interval(&mut self, seconds: i64, data_root: &Path) -> eyre::Result<()> {
        if seconds < MIN_UPDATE_INTERVAL_SECS {
            return Err(EngineError::InvalidInput(format!(
                "update interval must be at least {MIN_UPDATE_INTERVAL_SECS} seconds"
            ))
            .into());
        }
        self.auto_update_check_interval = seconds;
        self.save(data_root)
    }

    pub fn set_auto_update(&mut self, enabled: bool, data_root: &Path) -> eyre::Result<()> {
        self.auto_update_enabled = enabled;
        self.save(data_root)
    }

    pub fn should_check_for_update(&self) -> bool {
        if !self.auto_update_enabled {
            return false;
        }
        now_unix() - self.last_update_check >= self.auto_update_check_interval
    }
}

/// Write `contents` to `path` via write-to-temp-then-rename, with mode 0600.
pub fn write_atomic_0600(path: &Path, contents: &[u8]) -> eyre::Result<()> {
    use std::io::Write;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp_path: PathBuf = dir.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        std::process::id()
    ));

    {
        let mut f = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        f.write_all(contents)?;
        f.flush()?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn loads_defaults_when_missing_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(tmp.path()).unwrap();
        assert!(config.auto_update_enabled);
        assert!(crate::paths::config_path(tmp.path()).exists());
    }

    #[test]
    #[serial]
    fn round_trips_field_by_field() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::load(tmp.path()).unwrap();
        config.set_ip_mode("public", tmp.path()).unwrap();
        let before_update = config.updated_at;

        let reloaded = Config::load(tmp.path()).unwrap();
        assert_eq!(reloaded.ip_mode, IpMode::Public);
        assert_eq!(reloaded.host_ip, config.host_ip);
        assert_eq!(reloaded.auto_update_enabled, config.auto_update_enabled);
        assert!(reloaded.updated_at >= before_update);
    }

    #[test]
    #[serial]
    fn rejects_interval_below_minimum() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::load(tmp.path()).unwrap();
        assert!(config.set_update_interval(10, tmp.path()).is_err());
    }

    #[test]
    #[serial]
    fn should_check_false_when_disabled_regardless_of_interval() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::load(tmp.path()).unwrap();
        config.auto_update_check_interval = 1;
        config.last_update_check = 0;
        config.set_auto_update(false, tmp.path()).unwrap();
        assert!(!config.should_check_for_update());
    }

    #[test]
    #[serial]
    fn rejects_unknown_ip_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::load(tmp.path()).unwrap();
        assert!(config.set_ip_mode("bogus", tmp.path()).is_err());
    }
}
