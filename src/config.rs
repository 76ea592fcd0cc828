//! Agent configuration
//!
//! Values come from an optional YAML file and are then overridden by
//! command-line flags.

use crate::collectors::builder::{CollectorKind, DEFAULT_PROMETHEUS_URL};
use crate::metrics::AllowDenyList;
use crate::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub prometheus_url: String,
    pub apiserver: Option<String>,
    pub kubeconfig: Option<PathBuf>,
    pub namespaces: Vec<String>,
    pub collectors: Vec<String>,
    pub build_all_collectors: bool,
    pub metric_allowlist: Vec<String>,
    pub metric_denylist: Vec<String>,
    pub host: String,
    pub port: u16,
    pub interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prometheus_url: DEFAULT_PROMETHEUS_URL.to_string(),
            apiserver: None,
            kubeconfig: None,
            namespaces: Vec::new(),
            collectors: CollectorKind::ALL.iter().map(|k| k.name().to_string()).collect(),
            build_all_collectors: false,
            metric_allowlist: Vec::new(),
            metric_denylist: Vec::new(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            interval_secs: 15,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prometheus_url.trim().is_empty() {
            return Err(BoardError::ConfigError(
                "prometheus url must not be empty".to_string(),
            ));
        }

        if self.interval_secs == 0 {
            return Err(BoardError::ConfigError(
                "refresh interval must be at least one second".to_string(),
            ));
        }

        for name in &self.collectors {
            name.parse::<CollectorKind>()?;
        }

        self.allow_deny_list()?;
        self.listen_addr()?;

        Ok(())
    }

    pub fn allow_deny_list(&self) -> Result<AllowDenyList> {
        AllowDenyList::new(
            self.metric_allowlist.iter().cloned(),
            self.metric_denylist.iter().cloned(),
        )
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                BoardError::ConfigError(format!(
                    "Invalid listen address {}:{}: {}",
                    self.host, self.port, e
                ))
            })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
