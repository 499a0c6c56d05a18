//! Configuration loading
//!
//! Handles:
//! - YAML file (`pathdiag.yaml` or `$PATHDIAG_CONFIG`)
//! - Defaults when the file is missing or empty
//! - Conversion into kernel probe settings

use anyhow::{Context, Result};
use pathdiag_kernel::{ProbeCommands, ProbeSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_ENV: &str = "PATHDIAG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pathdiag.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DiagConfig {
    pub server: ServerConf,
    /// Project name or id
    pub project: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub probe: ProbeConf,
    pub commands: CommandsConf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConf {
    pub url: String,
    /// Per-request HTTP timeout
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProbeConf {
    pub connect_timeout_ms: u64,
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandsConf {
    pub end_host: String,
    pub router: String,
}

impl Default for ServerConf {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3080".into(),
            timeout_ms: 10_000,
        }
    }
}

impl Default for ProbeConf {
    fn default() -> Self {
        let defaults = ProbeSettings::default();
        Self {
            connect_timeout_ms: defaults.connect_timeout.as_millis() as u64,
            settle_ms: defaults.settle_delay.as_millis() as u64,
        }
    }
}

impl Default for CommandsConf {
    fn default() -> Self {
        let defaults = ProbeCommands::default();
        Self {
            end_host: defaults.end_host,
            router: defaults.router,
        }
    }
}

impl DiagConfig {
    /// `--config` wins, then `$PATHDIAG_CONFIG`, then `./pathdiag.yaml`.
    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let txt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: DiagConfig = serde_yaml::from_str(&txt)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.server.timeout_ms)
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            connect_timeout: Duration::from_millis(self.probe.connect_timeout_ms),
            settle_delay: Duration::from_millis(self.probe.settle_ms),
        }
    }

    pub fn probe_commands(&self) -> ProbeCommands {
        ProbeCommands {
            end_host: self.commands.end_host.clone(),
            router: self.commands.router.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiagConfig::load(&dir.path().join("absent.yaml")).await.unwrap();
        assert_eq!(config, DiagConfig::default());
        assert_eq!(config.probe_settings(), ProbeSettings::default());
        assert_eq!(config.probe_commands(), ProbeCommands::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathdiag.yaml");
        std::fs::write(
            &path,
            "server:\n  url: http://gns3.lab:3080\nproject: campus\nprobe:\n  settle_ms: 250\n",
        )
        .unwrap();

        let config = DiagConfig::load(&path).await.unwrap();
        assert_eq!(config.server.url, "http://gns3.lab:3080");
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.project.as_deref(), Some("campus"));
        assert_eq!(config.probe.settle_ms, 250);
        assert_eq!(config.probe.connect_timeout_ms, 3000);
        assert_eq!(config.commands.router, "show ip interface brief");
    }

    #[tokio::test]
    async fn test_empty_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathdiag.yaml");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(DiagConfig::load(&path).await.unwrap(), DiagConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathdiag.yaml");
        std::fs::write(&path, "probe: [not, a, map]\n").unwrap();
        let err = DiagConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = DiagConfig::config_path(Some(Path::new("/etc/pathdiag/lab.yaml")));
        assert_eq!(path, PathBuf::from("/etc/pathdiag/lab.yaml"));
    }
}
