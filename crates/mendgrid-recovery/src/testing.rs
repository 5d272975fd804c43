//! Test doubles shared by the action and dispatcher tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use mend_core::{
    HealthFacet, InstanceHealth, InstanceId, NodeGroup, NodeGroupId, ScalingBounds, ScalingGroup,
};
use mendgrid_inventory::{
    BoxFuture, InventoryReader, LookupError, LookupResult, MutationError, MutationResult,
    ScalingControl,
};
use mendgrid_state::{InstanceRecord, StateStore};

/// A mutation request as seen by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Terminate { instance_id: String, decrement_desired: bool },
    Scale { node_group: String, bounds: ScalingBounds },
}

/// Forwards to an in-memory store, records every mutation request and
/// fails the ones it is told to.
#[derive(Default)]
pub struct RecordingControl {
    pub store: Option<StateStore>,
    pub calls: Mutex<Vec<Call>>,
    pub reject_scaling: bool,
    pub reject_terminate: HashSet<String>,
}

impl RecordingControl {
    pub fn over(store: &StateStore) -> Self {
        Self {
            store: Some(store.clone()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl ScalingControl for RecordingControl {
    fn terminate_instance<'a>(
        &'a self,
        instance_id: &'a str,
        decrement_desired: bool,
    ) -> BoxFuture<'a, MutationResult<()>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Terminate {
                instance_id: instance_id.to_string(),
                decrement_desired,
            });
            if self.reject_terminate.contains(instance_id) {
                return Err(MutationError::rejected(instance_id, "instance is protected from scale-in"));
            }
            match &self.store {
                Some(store) => ScalingControl::terminate_instance(store, instance_id, decrement_desired).await,
                None => Ok(()),
            }
        })
    }

    fn update_node_group_scaling<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
        bounds: ScalingBounds,
    ) -> BoxFuture<'a, MutationResult<()>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Scale {
                node_group: node_group.to_string(),
                bounds,
            });
            if self.reject_scaling {
                return Err(MutationError::rejected(node_group, "update already in progress"));
            }
            match &self.store {
                Some(store) => {
                    ScalingControl::update_node_group_scaling(store, cluster, node_group, bounds).await
                }
                None => Ok(()),
            }
        })
    }
}

/// Inventory whose every read fails as unreachable.
pub struct UnreachableInventory;

impl InventoryReader for UnreachableInventory {
    fn list_node_groups<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, LookupResult<Vec<NodeGroupId>>> {
        Box::pin(async move { Err(LookupError::unreachable(format!("cluster/{cluster}"), "connection refused")) })
    }

    fn describe_node_group<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
    ) -> BoxFuture<'a, LookupResult<NodeGroup>> {
        Box::pin(async move {
            Err(LookupError::unreachable(
                format!("nodegroup/{cluster}/{node_group}"),
                "connection refused",
            ))
        })
    }

    fn describe_scaling_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, LookupResult<ScalingGroup>> {
        Box::pin(async move { Err(LookupError::unreachable(id, "connection refused")) })
    }

    fn instance_health<'a>(
        &'a self,
        _ids: &'a [InstanceId],
    ) -> BoxFuture<'a, LookupResult<HashMap<InstanceId, InstanceHealth>>> {
        Box::pin(async move { Err(LookupError::unreachable("instance-status", "connection refused")) })
    }
}

/// Control plane that accepts requests and never answers them.
pub struct Stalled;

impl InventoryReader for Stalled {
    fn list_node_groups<'a>(&'a self, _cluster: &'a str) -> BoxFuture<'a, LookupResult<Vec<NodeGroupId>>> {
        Box::pin(std::future::pending())
    }

    fn describe_node_group<'a>(
        &'a self,
        _cluster: &'a str,
        _node_group: &'a str,
    ) -> BoxFuture<'a, LookupResult<NodeGroup>> {
        Box::pin(std::future::pending())
    }

    fn describe_scaling_group<'a>(&'a self, _id: &'a str) -> BoxFuture<'a, LookupResult<ScalingGroup>> {
        Box::pin(std::future::pending())
    }

    fn instance_health<'a>(
        &'a self,
        _ids: &'a [InstanceId],
    ) -> BoxFuture<'a, LookupResult<HashMap<InstanceId, InstanceHealth>>> {
        Box::pin(std::future::pending())
    }
}

impl ScalingControl for Stalled {
    fn terminate_instance<'a>(
        &'a self,
        _instance_id: &'a str,
        _decrement_desired: bool,
    ) -> BoxFuture<'a, MutationResult<()>> {
        Box::pin(std::future::pending())
    }

    fn update_node_group_scaling<'a>(
        &'a self,
        _cluster: &'a str,
        _node_group: &'a str,
        _bounds: ScalingBounds,
    ) -> BoxFuture<'a, MutationResult<()>> {
        Box::pin(std::future::pending())
    }
}

/// Add a node group backed by `asg-{id}` with the given instances.
pub fn seed_group(
    store: &StateStore,
    cluster: &str,
    id: &str,
    bounds: ScalingBounds,
    instances: &[(&str, HealthFacet, HealthFacet)],
) {
    let scaling_group = format!("asg-{id}");
    store
        .put_node_group(&NodeGroup {
            id: id.to_string(),
            cluster: cluster.to_string(),
            scaling_group: scaling_group.clone(),
            bounds,
        })
        .unwrap();
    store
        .put_scaling_group(&ScalingGroup {
            id: scaling_group.clone(),
            instances: instances.iter().map(|(i, _, _)| i.to_string()).collect(),
            bounds,
        })
        .unwrap();
    for (inst, instance_status, system_status) in instances {
        store
            .put_instance(&InstanceRecord {
                id: inst.to_string(),
                scaling_group: scaling_group.clone(),
                health: InstanceHealth::new(*instance_status, *system_status),
            })
            .unwrap();
    }
}
