//! Inventory and mutation client traits.
//!
//! Methods return boxed futures so the traits stay object-safe; the
//! dispatcher holds `Arc<dyn InventoryReader>` and `Arc<dyn ScalingControl>`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use mend_core::{InstanceHealth, InstanceId, NodeGroup, NodeGroupId, ScalingBounds, ScalingGroup};

use crate::error::{LookupResult, MutationResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read-only view of cluster topology and instance health.
///
/// Every call reads the control plane's current state; implementations
/// must not cache across calls. A resource that no longer exists yields
/// `LookupError::NotFound`.
pub trait InventoryReader: Send + Sync {
    /// Node group identifiers for a cluster.
    fn list_node_groups<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, LookupResult<Vec<NodeGroupId>>>;

    fn describe_node_group<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
    ) -> BoxFuture<'a, LookupResult<NodeGroup>>;

    fn describe_scaling_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, LookupResult<ScalingGroup>>;

    /// Health of the given instances. Instances with no reported status
    /// are absent from the returned map.
    fn instance_health<'a>(
        &'a self,
        ids: &'a [InstanceId],
    ) -> BoxFuture<'a, LookupResult<HashMap<InstanceId, InstanceHealth>>>;
}

/// Mutation requests against the infrastructure control plane.
///
/// The control plane applies the change; callers only issue requests.
pub trait ScalingControl: Send + Sync {
    /// Terminate an instance that belongs to a scaling group.
    ///
    /// With `decrement_desired == false` the scaling group keeps its
    /// desired capacity and launches a replacement.
    fn terminate_instance<'a>(
        &'a self,
        instance_id: &'a str,
        decrement_desired: bool,
    ) -> BoxFuture<'a, MutationResult<()>>;

    /// Replace a node group's scaling bounds.
    fn update_node_group_scaling<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
        bounds: ScalingBounds,
    ) -> BoxFuture<'a, MutationResult<()>>;
}

impl<T: InventoryReader + ?Sized> InventoryReader for std::sync::Arc<T> {
    fn list_node_groups<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, LookupResult<Vec<NodeGroupId>>> {
        (**self).list_node_groups(cluster)
    }

    fn describe_node_group<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
    ) -> BoxFuture<'a, LookupResult<NodeGroup>> {
        (**self).describe_node_group(cluster, node_group)
    }

    fn describe_scaling_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, LookupResult<ScalingGroup>> {
        (**self).describe_scaling_group(id)
    }

    fn instance_health<'a>(
        &'a self,
        ids: &'a [InstanceId],
    ) -> BoxFuture<'a, LookupResult<HashMap<InstanceId, InstanceHealth>>> {
        (**self).instance_health(ids)
    }
}

impl<T: ScalingControl + ?Sized> ScalingControl for std::sync::Arc<T> {
    fn terminate_instance<'a>(
        &'a self,
        instance_id: &'a str,
        decrement_desired: bool,
    ) -> BoxFuture<'a, MutationResult<()>> {
        (**self).terminate_instance(instance_id, decrement_desired)
    }

    fn update_node_group_scaling<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
        bounds: ScalingBounds,
    ) -> BoxFuture<'a, MutationResult<()>> {
        (**self).update_node_group_scaling(cluster, node_group, bounds)
    }
}
