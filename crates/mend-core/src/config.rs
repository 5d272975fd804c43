//! mendgrid.toml configuration.
//!
//! Invocation settings are supplied out-of-band, never in the alarm batch.
//! The daemon layers CLI flags and environment variables over this file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryConfig {
    /// Cluster whose node groups are remediated.
    #[serde(default)]
    pub cluster_name: String,
    /// Notification channel (webhook URL). Absent disables reports.
    #[serde(default)]
    pub notification_channel: Option<String>,
    /// Deployment environment, used only for report labeling.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Bound applied to every control-plane call, e.g. "10s".
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
    /// Location of the local control-plane store.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_environment() -> String {
    "prod".to_string()
}

fn default_request_timeout() -> String {
    "10s".to_string()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("/var/lib/mendgrid/inventory.redb")
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            cluster_name: String::new(),
            notification_channel: None,
            environment: default_environment(),
            request_timeout: default_request_timeout(),
            state_path: default_state_path(),
        }
    }
}

impl RecoveryConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: RecoveryConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the dispatcher cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cluster_name.trim().is_empty() {
            anyhow::bail!("cluster name must be set");
        }
        match parse_duration(&self.request_timeout) {
            None => anyhow::bail!("invalid request timeout {:?}", self.request_timeout),
            Some(d) if d.is_zero() => anyhow::bail!("request timeout must be positive"),
            Some(_) => {}
        }
        Ok(())
    }

    /// The configured per-call timeout.
    pub fn request_timeout(&self) -> Duration {
        parse_duration(&self.request_timeout).unwrap_or(Duration::from_secs(10))
    }

    /// Notification channel, treating an empty string as unset.
    pub fn channel(&self) -> Option<&str> {
        self.notification_channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
