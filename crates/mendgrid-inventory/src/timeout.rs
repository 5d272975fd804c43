//! Per-call timeout for control-plane clients.
//!
//! `Bounded` wraps any `InventoryReader` or `ScalingControl` and converts a
//! call that outlives its deadline into the `Timeout` variant of the
//! corresponding error, so callers treat it as an ordinary failure.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use mend_core::{InstanceHealth, InstanceId, NodeGroup, NodeGroupId, ScalingBounds, ScalingGroup};

use crate::client::{BoxFuture, InventoryReader, ScalingControl};
use crate::error::{LookupError, LookupResult, MutationError, MutationResult};

/// A client whose every call is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct Bounded<T> {
    inner: T,
    timeout: Duration,
}

impl<T> Bounded<T> {
    pub fn new(inner: T, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

async fn bounded_lookup<V>(
    timeout: Duration,
    resource: String,
    fut: impl Future<Output = LookupResult<V>>,
) -> LookupResult<V> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(%resource, ?timeout, "inventory read timed out");
            Err(LookupError::Timeout {
                resource,
                elapsed: timeout,
            })
        }
    }
}

async fn bounded_mutation(
    timeout: Duration,
    resource: String,
    fut: impl Future<Output = MutationResult<()>>,
) -> MutationResult<()> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(%resource, ?timeout, "mutation request timed out");
            Err(MutationError::Timeout {
                resource,
                elapsed: timeout,
            })
        }
    }
}

impl<T: InventoryReader> InventoryReader for Bounded<T> {
    fn list_node_groups<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, LookupResult<Vec<NodeGroupId>>> {
        Box::pin(bounded_lookup(
            self.timeout,
            format!("cluster/{cluster}"),
            self.inner.list_node_groups(cluster),
        ))
    }

    fn describe_node_group<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
    ) -> BoxFuture<'a, LookupResult<NodeGroup>> {
        Box::pin(bounded_lookup(
            self.timeout,
            format!("nodegroup/{cluster}/{node_group}"),
            self.inner.describe_node_group(cluster, node_group),
        ))
    }

    fn describe_scaling_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, LookupResult<ScalingGroup>> {
        Box::pin(bounded_lookup(
            self.timeout,
            format!("scalinggroup/{id}"),
            self.inner.describe_scaling_group(id),
        ))
    }

    fn instance_health<'a>(
        &'a self,
        ids: &'a [InstanceId],
    ) -> BoxFuture<'a, LookupResult<HashMap<InstanceId, InstanceHealth>>> {
        Box::pin(bounded_lookup(
            self.timeout,
            format!("instance-status/{}", ids.join(",")),
            self.inner.instance_health(ids),
        ))
    }
}

impl<T: ScalingControl> ScalingControl for Bounded<T> {
    fn terminate_instance<'a>(
        &'a self,
        instance_id: &'a str,
        decrement_desired: bool,
    ) -> BoxFuture<'a, MutationResult<()>> {
        Box::pin(bounded_mutation(
            self.timeout,
            format!("instance/{instance_id}"),
            self.inner.terminate_instance(instance_id, decrement_desired),
        ))
    }

    fn update_node_group_scaling<'a>(
        &'a self,
        cluster: &'a str,
        node_group: &'a str,
        bounds: ScalingBounds,
    ) -> BoxFuture<'a, MutationResult<()>> {
        Box::pin(bounded_mutation(
            self.timeout,
            format!("nodegroup/{cluster}/{node_group}"),
            self.inner.update_node_group_scaling(cluster, node_group, bounds),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers every call after `delay`.
    struct Slow {
        delay: Duration,
    }

    impl InventoryReader for Slow {
        fn list_node_groups<'a>(&'a self, _cluster: &'a str) -> BoxFuture<'a, LookupResult<Vec<NodeGroupId>>> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Ok(vec!["ng-a".to_string()])
            })
        }

        fn describe_node_group<'a>(
            &'a self,
            _cluster: &'a str,
            node_group: &'a str,
        ) -> BoxFuture<'a, LookupResult<NodeGroup>> {
            Box::pin(async move { Err(LookupError::not_found(node_group)) })
        }

        fn describe_scaling_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, LookupResult<ScalingGroup>> {
            Box::pin(async move { Err(LookupError::not_found(id)) })
        }

        fn instance_health<'a>(
            &'a self,
            _ids: &'a [InstanceId],
        ) -> BoxFuture<'a, LookupResult<HashMap<InstanceId, InstanceHealth>>> {
            Box::pin(async move { Ok(HashMap::new()) })
        }
    }

    impl ScalingControl for Slow {
        fn terminate_instance<'a>(
            &'a self,
            _instance_id: &'a str,
            _decrement_desired: bool,
        ) -> BoxFuture<'a, MutationResult<()>> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Ok(())
            })
        }

        fn update_node_group_scaling<'a>(
            &'a self,
            _cluster: &'a str,
            _node_group: &'a str,
            _bounds: ScalingBounds,
        ) -> BoxFuture<'a, MutationResult<()>> {
            Box::pin(async move { Ok(()) })
        }
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let client = Bounded::new(Slow { delay: Duration::from_millis(1) }, Duration::from_secs(5));
        let groups = client.list_node_groups("prod").await.unwrap();
        assert_eq!(groups, vec!["ng-a".to_string()]);
    }

    #[tokio::test]
    async fn inner_errors_pass_through() {
        let client = Bounded::new(Slow { delay: Duration::ZERO }, Duration::from_secs(5));
        let err = client.describe_node_group("prod", "ng-x").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn slow_read_becomes_lookup_timeout() {
        let client = Bounded::new(Slow { delay: Duration::from_secs(5) }, Duration::from_millis(20));
        let err = client.list_node_groups("prod").await.unwrap_err();
        assert_eq!(
            err,
            LookupError::Timeout {
                resource: "cluster/prod".to_string(),
                elapsed: Duration::from_millis(20),
            }
        );
    }

    #[tokio::test]
    async fn slow_mutation_becomes_mutation_timeout() {
        let client = Bounded::new(Slow { delay: Duration::from_secs(5) }, Duration::from_millis(20));
        let err = client.terminate_instance("i-1", false).await.unwrap_err();
        assert!(matches!(err, MutationError::Timeout { .. }));
        assert_eq!(err.resource(), "instance/i-1");
    }
}
