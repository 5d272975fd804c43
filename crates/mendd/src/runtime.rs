//! Dispatcher assembly.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use mend_core::RecoveryConfig;
use mendgrid_inventory::Bounded;
use mendgrid_notify::Notifier;
use mendgrid_recovery::RecoveryDispatcher;
use mendgrid_state::StateStore;

/// Open (or create) the local control-plane store at the configured path.
pub fn open_store(config: &RecoveryConfig) -> anyhow::Result<StateStore> {
    if let Some(parent) = config.state_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let store = StateStore::open(&config.state_path)
        .with_context(|| format!("failed to open state store {}", config.state_path.display()))?;
    info!(path = %config.state_path.display(), "state store opened");
    Ok(store)
}

/// Wire a dispatcher over `store`, bounding every control-plane call by the
/// configured timeout.
pub fn build_dispatcher(config: &RecoveryConfig, store: StateStore) -> anyhow::Result<RecoveryDispatcher> {
    config.validate()?;
    let timeout = config.request_timeout();

    let notifier = Notifier::from_config(config, timeout).context("invalid notification channel")?;
    if !notifier.is_enabled() {
        info!("no notification channel configured, reports will only be logged");
    }

    let inventory = Arc::new(Bounded::new(store.clone(), timeout));
    let control = Arc::new(Bounded::new(store, timeout));

    info!(
        cluster = %config.cluster_name,
        environment = %config.environment,
        ?timeout,
        "recovery dispatcher ready"
    );
    Ok(RecoveryDispatcher::new(&config.cluster_name, inventory, control, notifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(build_dispatcher(&RecoveryConfig::default(), store.clone()).is_err());

        let config = RecoveryConfig {
            cluster_name: "prod-eks".to_string(),
            notification_channel: Some("sns://topic".to_string()),
            ..Default::default()
        };
        let err = build_dispatcher(&config, store).unwrap_err();
        assert!(err.to_string().contains("invalid notification channel"));
    }

    #[test]
    fn open_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecoveryConfig {
            cluster_name: "prod-eks".to_string(),
            state_path: dir.path().join("nested/inventory.redb"),
            ..Default::default()
        };
        let store = open_store(&config).unwrap();
        assert!(config.state_path.exists());

        let dispatcher = build_dispatcher(&config, store).unwrap();
        assert_eq!(dispatcher.cluster(), "prod-eks");
    }
}
