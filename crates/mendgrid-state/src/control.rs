//! `InventoryReader` and `ScalingControl` over the local store.
//!
//! Missing records map to `NotFound`; storage failures map to
//! `Unreachable`. Invalid scaling bounds are `Rejected`, as a real control
//! plane would refuse them.

use std::collections::HashMap;

use tracing::debug;

use mend_core::{InstanceHealth, InstanceId, NodeGroup, NodeGroupId, ScalingBounds, ScalingGroup};
use mendgrid_inventory::{
    BoxFuture, InventoryReader, LookupError, LookupResult, MutationError, MutationResult,
    ScalingControl,
};

use crate::error::StateError;
use crate::store::StateStore;

impl InventoryReader for StateStore {
    fn list_node_groups<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, LookupResult<Vec<NodeGroupId>>> {
        Box::pin(async move {
            let groups = StateStore::list_node_groups(self, cluster)
                .map_err(|e| LookupError::unreachable(format!("cluster/{cluster}"), e))?;
            Ok(groups.into_iter().map(|g| g.id).collect())
        })
    }

    fn describe_node_group<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
    ) -> BoxFuture<'a, LookupResult<NodeGroup>> {
        Box::pin(async move {
            let resource = format!("nodegroup/{cluster}/{node_group}");
            match self.get_node_group(cluster, node_group) {
                Ok(Some(group)) => Ok(group),
                Ok(None) => Err(LookupError::not_found(resource)),
                Err(e) => Err(LookupError::unreachable(resource, e)),
            }
        })
    }

    fn describe_scaling_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, LookupResult<ScalingGroup>> {
        Box::pin(async move {
            let resource = format!("scalinggroup/{id}");
            match self.get_scaling_group(id) {
                Ok(Some(group)) => Ok(group),
                Ok(None) => Err(LookupError::not_found(resource)),
                Err(e) => Err(LookupError::unreachable(resource, e)),
            }
        })
    }

    fn instance_health<'a>(
        &'a self,
        ids: &'a [InstanceId],
    ) -> BoxFuture<'a, LookupResult<HashMap<InstanceId, InstanceHealth>>> {
        Box::pin(async move {
            let mut health = HashMap::with_capacity(ids.len());
            for id in ids {
                match self.get_instance(id) {
                    Ok(Some(record)) => {
                        health.insert(id.clone(), record.health);
                    }
                    Ok(None) => debug!(instance = %id, "no status reported"),
                    Err(e) => return Err(LookupError::unreachable(format!("instance/{id}"), e)),
                }
            }
            Ok(health)
        })
    }
}

impl ScalingControl for StateStore {
    fn terminate_instance<'a>(
        &'a self,
        instance_id: &'a str,
        decrement_desired: bool,
    ) -> BoxFuture<'a, MutationResult<()>> {
        Box::pin(async move {
            let resource = format!("instance/{instance_id}");
            match StateStore::terminate_instance(self, instance_id, decrement_desired) {
                Ok(Some(_)) => Ok(()),
                Ok(None) => Err(MutationError::not_found(resource)),
                Err(e) => Err(MutationError::unreachable(resource, e)),
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
            let resource = format!("nodegroup/{cluster}/{node_group}");
            match StateStore::update_node_group_scaling(self, cluster, node_group, bounds) {
                Ok(Some(_)) => Ok(()),
                Ok(None) => Err(MutationError::not_found(resource)),
                Err(StateError::Invalid(reason)) => Err(MutationError::rejected(resource, reason)),
                Err(e) => Err(MutationError::unreachable(resource, e)),
            }
        })
    }
}
