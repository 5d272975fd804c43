//! Remediation actions.
//!
//! Each action re-reads the state it depends on before mutating, so it
//! is safe to run when its precondition no longer holds. Actions never
//! return an error: lookup and mutation failures are folded into the
//! `RecoveryResult` (success flag plus a detail line naming the cause).
//!
//! Resources that disappear mid-scan (`NotFound`) are skipped and noted;
//! any other failure marks the result failed, and the scan continues.

use tracing::{debug, info, warn};

use mend_core::{ActionTag, AlarmEvent, RecoveryResult, RecoveryResultBuilder, ScalingBounds};
use mendgrid_inventory::{InventoryReader, LookupError, ScalingControl};

pub const POD_RESTART_GUIDANCE: &str = "High pod restart count detected. \
    Kubernetes will handle pod recovery automatically. \
    Manual investigation recommended to identify root cause.";

pub const RESOURCE_PRESSURE_GUIDANCE: &str = "High resource utilization detected. \
    Consider scaling out your application or nodes. \
    Check HPA settings if available.";

pub const UNHEALTHY_HOSTS_GUIDANCE: &str = "Unhealthy targets detected in load balancer. \
    Kubernetes readiness probes should handle pod-level issues. \
    Check pod logs and node status for investigation.";

/// What an action operates on: one cluster, through the control-plane clients.
#[derive(Clone, Copy)]
pub struct Remediation<'a> {
    pub cluster: &'a str,
    pub inventory: &'a dyn InventoryReader,
    pub control: &'a dyn ScalingControl,
}

impl<'a> Remediation<'a> {
    pub fn new(
        cluster: &'a str,
        inventory: &'a dyn InventoryReader,
        control: &'a dyn ScalingControl,
    ) -> Self {
        Self {
            cluster,
            inventory,
            control,
        }
    }

    /// Run the action selected for `alarm`.
    pub async fn execute(&self, action: ActionTag, alarm: &AlarmEvent) -> RecoveryResult {
        match action {
            ActionTag::TerminateUnhealthyInstance => self.terminate_unhealthy_instances(alarm).await,
            ActionTag::ScaleUpNodeGroup => self.scale_up_node_groups(alarm).await,
            ActionTag::AdvisoryOnly
            | ActionTag::AdvisoryWithRecommendation
            | ActionTag::AdvisoryInvestigate => advisory(action, alarm),
            ActionTag::NoAction => no_action(alarm),
        }
    }

    /// Terminate every instance with a non-ok health facet, keeping the
    /// scaling group's desired capacity so it launches a replacement.
    pub async fn terminate_unhealthy_instances(&self, alarm: &AlarmEvent) -> RecoveryResult {
        let mut result = RecoveryResult::builder(&alarm.name, ActionTag::TerminateUnhealthyInstance);
        let mut unhealthy = 0usize;

        let node_groups = match self.inventory.list_node_groups(self.cluster).await {
            Ok(ids) => ids,
            Err(e) => {
                result.fail(format!("Failed to handle status check failure: {e}"));
                return result.build();
            }
        };

        for ng_id in &node_groups {
            let group = match self.inventory.describe_node_group(self.cluster, ng_id).await {
                Ok(group) => group,
                Err(e) => {
                    record_lookup_failure(&mut result, &format!("node group {ng_id}"), &e);
                    continue;
                }
            };
            let scaling = match self.inventory.describe_scaling_group(&group.scaling_group).await {
                Ok(sg) => sg,
                Err(e) => {
                    record_lookup_failure(&mut result, &format!("scaling group {}", group.scaling_group), &e);
                    continue;
                }
            };
            if scaling.instances.is_empty() {
                debug!(node_group = %ng_id, "scaling group has no instances");
                continue;
            }
            let health = match self.inventory.instance_health(&scaling.instances).await {
                Ok(health) => health,
                Err(e) => {
                    record_lookup_failure(&mut result, &format!("instance health for {ng_id}"), &e);
                    continue;
                }
            };

            for instance_id in &scaling.instances {
                let Some(status) = health.get(instance_id) else {
                    debug!(instance = %instance_id, "no health reported, skipping");
                    continue;
                };
                if !status.is_unhealthy() {
                    continue;
                }
                unhealthy += 1;

                info!(
                    instance = %instance_id,
                    node_group = %ng_id,
                    instance_status = %status.instance_status,
                    system_status = %status.system_status,
                    "terminating unhealthy instance"
                );
                match self.control.terminate_instance(instance_id, false).await {
                    Ok(()) => {
                        result.line(format!(
                            "Terminated unhealthy instance: {instance_id} (node group {ng_id}, \
                             instance status {}, system status {}).",
                            status.instance_status, status.system_status
                        ));
                    }
                    Err(e) if e.is_not_found() => {
                        result.line(format!("Instance {instance_id} already terminated: {e}."));
                    }
                    Err(e) => {
                        warn!(instance = %instance_id, error = %e, "terminate request failed");
                        result.fail(format!("Failed to terminate instance {instance_id}: {e}."));
                    }
                }
            }
        }

        if unhealthy == 0 && result.is_success() {
            result.line("No unhealthy instances found to terminate.");
        }
        result.build()
    }

    /// Nudge every node group sitting at its floor up by one.
    pub async fn scale_up_node_groups(&self, alarm: &AlarmEvent) -> RecoveryResult {
        let mut result = RecoveryResult::builder(&alarm.name, ActionTag::ScaleUpNodeGroup);
        let mut scaled = 0usize;

        let node_groups = match self.inventory.list_node_groups(self.cluster).await {
            Ok(ids) => ids,
            Err(e) => {
                result.fail(format!("Failed to scale up nodes: {e}"));
                return result.build();
            }
        };

        for ng_id in &node_groups {
            let group = match self.inventory.describe_node_group(self.cluster, ng_id).await {
                Ok(group) => group,
                Err(e) => {
                    record_lookup_failure(&mut result, &format!("node group {ng_id}"), &e);
                    continue;
                }
            };
            let current = group.bounds;
            if current.min > current.max {
                result.line(format!("Skipped node group {ng_id}: invalid scaling bounds ({current})."));
                continue;
            }
            let Some(desired) = next_desired(current) else {
                debug!(node_group = %ng_id, bounds = %current, "node group above floor");
                continue;
            };

            let target = current.with_desired(desired);
            match self
                .control
                .update_node_group_scaling(self.cluster, ng_id, target)
                .await
            {
                Ok(()) => {
                    scaled += 1;
                    info!(node_group = %ng_id, from = current.desired, to = desired, "scaled node group");
                    result.line(format!(
                        "Scaled nodegroup {ng_id} from {} to {desired}.",
                        current.desired
                    ));
                }
                Err(e) if e.is_not_found() => {
                    result.line(format!("Skipped node group {ng_id}: {e}."));
                }
                Err(e) => {
                    warn!(node_group = %ng_id, error = %e, "scaling request failed");
                    result.fail(format!("Failed to scale nodegroup {ng_id}: {e}."));
                }
            }
        }

        if scaled == 0 && result.is_success() {
            result.line("Node groups are already at or above minimum capacity.");
        }
        result.build()
    }
}

/// Desired capacity to request for a group at its floor, or `None` if the
/// group needs nothing. Always within `[min, max]`.
pub fn next_desired(bounds: ScalingBounds) -> Option<u32> {
    if bounds.min > bounds.max {
        return None;
    }
    if bounds.desired <= bounds.min && bounds.desired < bounds.max {
        Some((bounds.desired + 1).clamp(bounds.min, bounds.max))
    } else {
        None
    }
}

/// Fixed operator guidance; never mutates anything.
pub fn advisory(action: ActionTag, alarm: &AlarmEvent) -> RecoveryResult {
    let guidance = match action {
        ActionTag::AdvisoryOnly => POD_RESTART_GUIDANCE,
        ActionTag::AdvisoryWithRecommendation => RESOURCE_PRESSURE_GUIDANCE,
        ActionTag::AdvisoryInvestigate => UNHEALTHY_HOSTS_GUIDANCE,
        _ => return no_action(alarm),
    };
    info!(alarm = %alarm.name, %action, "{guidance}");
    let mut result = RecoveryResult::builder(&alarm.name, action);
    result.line(guidance);
    result.build()
}

/// No rule matched; absence of a policy is not an error.
pub fn no_action(alarm: &AlarmEvent) -> RecoveryResult {
    let mut result = RecoveryResult::builder(&alarm.name, ActionTag::NoAction);
    result.line(format!("No auto-recovery action defined for alarm: {}", alarm.name));
    info!(alarm = %alarm.name, "no auto-recovery action defined");
    result.build()
}

fn record_lookup_failure(result: &mut RecoveryResultBuilder, what: &str, err: &LookupError) {
    if err.is_not_found() {
        debug!(resource = %err.resource(), "resource vanished, skipping");
        result.line(format!("Skipped {what}: {err}."));
    } else {
        warn!(resource = %err.resource(), error = %err, "inventory lookup failed");
        result.fail(format!("Failed to read {what}: {err}."));
    }
}
