//! Configuration layering: defaults, then `mendgrid.toml`, then
//! environment variables and CLI flags.

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use mend_core::RecoveryConfig;

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Path to a mendgrid.toml file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Cluster whose node groups are remediated.
    #[arg(long, env = "CLUSTER_NAME")]
    pub cluster_name: Option<String>,

    /// Webhook URL for recovery reports. Unset disables notification.
    #[arg(long, env = "NOTIFICATION_CHANNEL")]
    pub notification_channel: Option<String>,

    /// Environment label used in reports.
    #[arg(long, env = "ENVIRONMENT")]
    pub environment: Option<String>,

    /// Local control-plane store.
    #[arg(long, env = "MENDGRID_STATE_PATH")]
    pub state_path: Option<PathBuf>,

    /// Per-call control-plane timeout ("10s", "500ms", "1m").
    #[arg(long, env = "MENDGRID_REQUEST_TIMEOUT")]
    pub request_timeout: Option<String>,
}

impl ConfigArgs {
    /// Merge the layers without validating.
    pub fn layered(&self) -> anyhow::Result<RecoveryConfig> {
        let mut config = match &self.config {
            Some(path) => RecoveryConfig::from_file(path)?,
            None => RecoveryConfig::default(),
        };

        if let Some(cluster) = &self.cluster_name {
            config.cluster_name = cluster.clone();
        }
        if let Some(channel) = &self.notification_channel {
            config.notification_channel = Some(channel.clone());
        }
        if let Some(environment) = &self.environment {
            config.environment = environment.clone();
        }
        if let Some(path) = &self.state_path {
            config.state_path = path.clone();
        }
        if let Some(timeout) = &self.request_timeout {
            config.request_timeout = timeout.clone();
        }

        debug!(
            cluster = %config.cluster_name,
            environment = %config.environment,
            state_path = %config.state_path.display(),
            notify = config.channel().is_some(),
            "configuration resolved"
        );
        Ok(config)
    }

    /// Merge the layers and reject settings the dispatcher cannot run with.
    pub fn resolve(&self) -> anyhow::Result<RecoveryConfig> {
        let config = self.layered()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
cluster_name = "from-file"
environment = "staging"
request_timeout = "3s"
"#
        )
        .unwrap();

        let args = ConfigArgs {
            config: Some(file.path().to_path_buf()),
            cluster_name: Some("from-flag".to_string()),
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.cluster_name, "from-flag");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn defaults_without_file() {
        let args = ConfigArgs {
            cluster_name: Some("prod-eks".to_string()),
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.environment, "prod");
        assert!(config.channel().is_none());
    }

    #[test]
    fn missing_cluster_is_rejected() {
        let args = ConfigArgs::default();
        assert!(args.layered().is_ok());
        assert!(args.resolve().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/mendgrid.toml")),
            cluster_name: Some("prod-eks".to_string()),
            ..Default::default()
        };
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
