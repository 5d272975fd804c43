//! Formats and emits one report per recovery result.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use mend_core::{RecoveryConfig, RecoveryResult};

use crate::channel::{NotificationChannel, WebhookChannel};
use crate::error::NotifyError;
use crate::report::Report;

/// Emits recovery reports. Never fails the caller.
#[derive(Clone)]
pub struct Notifier {
    cluster: String,
    environment: String,
    channel: Option<Arc<dyn NotificationChannel>>,
}

impl Notifier {
    /// A notifier with no channel; `notify` only logs.
    pub fn new(cluster: &str, environment: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            environment: environment.to_string(),
            channel: None,
        }
    }

    /// Set the channel reports are published to.
    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Build from invocation configuration.
    ///
    /// An absent channel disables notification; a malformed one is an
    /// error so it is caught at startup rather than on every alarm.
    pub fn from_config(config: &RecoveryConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let notifier = Self::new(&config.cluster_name, &config.environment);
        match config.channel() {
            Some(endpoint) => {
                let channel = WebhookChannel::new(endpoint, timeout)?;
                Ok(notifier.with_channel(Arc::new(channel)))
            }
            None => Ok(notifier),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    /// Publish the report for `result`. Failures are logged and swallowed.
    pub async fn notify(&self, alarm_name: &str, result: &RecoveryResult) {
        let Some(channel) = &self.channel else {
            warn!(alarm = %alarm_name, "notification channel not set, skipping notification");
            return;
        };

        let report = Report::render(&self.environment, &self.cluster, alarm_name, result);
        match channel.publish(&report.subject, &report.body).await {
            Ok(()) => info!(alarm = %alarm_name, channel = %channel.id(), "notification sent"),
            Err(e) => error!(
                alarm = %alarm_name,
                channel = %channel.id(),
                error = %e,
                "failed to send notification"
            ),
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("cluster", &self.cluster)
            .field("environment", &self.environment)
            .field("channel", &self.channel.as_ref().map(|c| c.id().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use mend_core::ActionTag;

    use crate::channel::BoxFuture;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl NotificationChannel for Recording {
        fn id(&self) -> &str {
            "recording"
        }

        fn publish<'a>(&'a self, subject: &'a str, message: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
            Box::pin(async move {
                self.sent
                    .lock()
                    .unwrap()
                    .push((subject.to_string(), message.to_string()));
                if self.fail {
                    Err(NotifyError::Rejected {
                        endpoint: "recording".to_string(),
                        status: 500,
                    })
                } else {
                    Ok(())
                }
            })
        }
    }

    fn result() -> RecoveryResult {
        let mut b = RecoveryResult::builder("cpu-high-ng-a", ActionTag::AdvisoryWithRecommendation);
        b.line("High resource utilization detected.");
        b.build()
    }

    #[tokio::test]
    async fn publishes_rendered_report() {
        let channel = Arc::new(Recording::default());
        let notifier = Notifier::new("prod-eks", "prod").with_channel(channel.clone());
        assert!(notifier.is_enabled());

        notifier.notify("cpu-high-ng-a", &result()).await;

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "[SUCCESS] Cluster Auto Recovery - cpu-high-ng-a");
        assert!(sent[0].1.contains("Cluster: prod-eks"));
    }

    #[tokio::test]
    async fn channel_failure_is_swallowed() {
        let channel = Arc::new(Recording {
            fail: true,
            ..Default::default()
        });
        let notifier = Notifier::new("prod-eks", "prod").with_channel(channel.clone());

        notifier.notify("cpu-high-ng-a", &result()).await;
        assert_eq!(channel.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disabled_notifier_is_a_noop() {
        let notifier = Notifier::new("prod-eks", "prod");
        assert!(!notifier.is_enabled());
        notifier.notify("cpu-high-ng-a", &result()).await;
    }

    #[test]
    fn from_config_without_channel() {
        let config = RecoveryConfig {
            cluster_name: "prod-eks".to_string(),
            ..Default::default()
        };
        let notifier = Notifier::from_config(&config, Duration::from_secs(1)).unwrap();
        assert!(!notifier.is_enabled());
    }

    #[test]
    fn from_config_rejects_bad_channel() {
        let config = RecoveryConfig {
            cluster_name: "prod-eks".to_string(),
            notification_channel: Some("ftp://nope".to_string()),
            ..Default::default()
        };
        assert!(Notifier::from_config(&config, Duration::from_secs(1)).is_err());
    }
}
