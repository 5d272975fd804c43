//! Recovery dispatcher: one entry point per invocation.
//!
//! Alarms in a batch are processed sequentially and independently: a
//! failed remediation never prevents the next alarm from being handled.

use std::sync::Arc;

use tracing::{debug, info, warn};

use mend_core::{AlarmEvent, AlarmState, InputResult, InvocationStatus, RecoveryResult, parse_batch};
use mendgrid_inventory::{InventoryReader, ScalingControl};
use mendgrid_notify::Notifier;

use crate::actions::Remediation;
use crate::classifier::classify;

/// What happened to a single alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The alarm was not firing; nothing was classified or executed.
    Skipped { state: AlarmState },
    Completed(RecoveryResult),
}

pub struct RecoveryDispatcher {
    cluster: String,
    inventory: Arc<dyn InventoryReader>,
    control: Arc<dyn ScalingControl>,
    notifier: Notifier,
}

impl RecoveryDispatcher {
    pub fn new(
        cluster: &str,
        inventory: Arc<dyn InventoryReader>,
        control: Arc<dyn ScalingControl>,
        notifier: Notifier,
    ) -> Self {
        Self {
            cluster: cluster.to_string(),
            inventory,
            control,
            notifier,
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Classify and remediate one alarm. Does not notify.
    pub async fn dispatch(&self, alarm: &AlarmEvent) -> DispatchOutcome {
        if !alarm.state.is_firing() {
            debug!(
                alarm = %alarm.name,
                state = %alarm.state,
                raw_state = alarm.payload_str("NewStateValue").unwrap_or_default(),
                "alarm not firing, skipping"
            );
            return DispatchOutcome::Skipped { state: alarm.state };
        }

        let action = classify(&alarm.name);
        info!(alarm = %alarm.name, %action, cluster = %self.cluster, "dispatching recovery");

        let ctx = Remediation::new(&self.cluster, self.inventory.as_ref(), self.control.as_ref());
        let result = ctx.execute(action, alarm).await;

        if result.success {
            info!(alarm = %alarm.name, %action, "recovery completed");
        } else {
            warn!(alarm = %alarm.name, %action, detail = %result.detail, "recovery failed");
        }
        DispatchOutcome::Completed(result)
    }

    /// Dispatch every alarm in order, notifying once per completed alarm.
    pub async fn handle_batch(&self, alarms: &[AlarmEvent]) -> InvocationStatus {
        let mut results = Vec::with_capacity(alarms.len());
        let mut skipped = 0usize;

        for alarm in alarms {
            match self.dispatch(alarm).await {
                DispatchOutcome::Skipped { .. } => skipped += 1,
                DispatchOutcome::Completed(result) => {
                    self.notifier.notify(&alarm.name, &result).await;
                    results.push(result);
                }
            }
        }

        let status = InvocationStatus::completed(results, skipped);
        info!(
            alarms = alarms.len(),
            completed = status.results.len(),
            failed = status.failed_count(),
            skipped,
            "batch handled"
        );
        status
    }

    /// Parse a raw notification envelope and handle its alarms.
    ///
    /// Only a malformed envelope is an error; per-alarm failures are in
    /// the returned status.
    pub async fn handle_raw(&self, raw: &[u8]) -> InputResult<InvocationStatus> {
        let alarms = parse_batch(raw)?;
        Ok(self.handle_batch(&alarms).await)
    }
}

impl std::fmt::Debug for RecoveryDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryDispatcher")
            .field("cluster", &self.cluster)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
