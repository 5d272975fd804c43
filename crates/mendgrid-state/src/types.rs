//! Records persisted by the local control plane.

use serde::{Deserialize, Serialize};

use mend_core::{InstanceHealth, InstanceId, ScalingBounds, ScalingGroupId};

/// An instance and its last reported health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub scaling_group: ScalingGroupId,
    pub health: InstanceHealth,
}

/// A mutation request the control plane accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    TerminateInstance {
        instance_id: InstanceId,
        scaling_group: ScalingGroupId,
        decrement_desired: bool,
    },
    UpdateScaling {
        cluster: String,
        node_group: String,
        from: ScalingBounds,
        to: ScalingBounds,
    },
}

/// One entry of the mutation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub seq: u64,
    pub mutation: Mutation,
    /// Unix timestamp (seconds) when the request was applied.
    pub applied_at: u64,
}

pub(crate) fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
