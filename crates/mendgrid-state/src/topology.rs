//! Topology files for seeding the local control plane.
//!
//! ```toml
//! [[node_groups]]
//! cluster = "prod"
//! id = "ng-a"
//! min = 2
//! desired = 2
//! max = 5
//!
//! [[node_groups.instances]]
//! id = "i-0a1b"
//! system_status = "impaired"
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use mend_core::{HealthFacet, InstanceHealth, NodeGroup, ScalingBounds, ScalingGroup};

use crate::error::{StateError, StateResult};
use crate::store::StateStore;
use crate::types::InstanceRecord;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Topology {
    #[serde(default)]
    pub node_groups: Vec<NodeGroupSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeGroupSpec {
    pub cluster: String,
    pub id: String,
    /// Backing scaling group; defaults to `{id}-asg`.
    pub scaling_group: Option<String>,
    pub min: u32,
    pub desired: u32,
    pub max: u32,
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceSpec {
    pub id: String,
    #[serde(default = "ok_facet")]
    pub instance_status: HealthFacet,
    #[serde(default = "ok_facet")]
    pub system_status: HealthFacet,
}

fn ok_facet() -> HealthFacet {
    HealthFacet::Ok
}

impl NodeGroupSpec {
    fn scaling_group_id(&self) -> String {
        self.scaling_group
            .clone()
            .unwrap_or_else(|| format!("{}-asg", self.id))
    }
}

impl Topology {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let topology: Topology = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(topology)
    }

    /// Write every node group, scaling group and instance into the store.
    ///
    /// Existing records with the same keys are overwritten. Returns the
    /// number of node groups written.
    pub fn apply(&self, store: &StateStore) -> StateResult<usize> {
        for spec in &self.node_groups {
            let bounds = ScalingBounds::new(spec.min, spec.desired, spec.max);
            bounds
                .validate()
                .map_err(|e| StateError::Invalid(format!("{}/{}: {e}", spec.cluster, spec.id)))?;

            let scaling_group = spec.scaling_group_id();
            store.put_node_group(&NodeGroup {
                id: spec.id.clone(),
                cluster: spec.cluster.clone(),
                scaling_group: scaling_group.clone(),
                bounds,
            })?;
            store.put_scaling_group(&ScalingGroup {
                id: scaling_group.clone(),
                instances: spec.instances.iter().map(|i| i.id.clone()).collect(),
                bounds,
            })?;
            for inst in &spec.instances {
                store.put_instance(&InstanceRecord {
                    id: inst.id.clone(),
                    scaling_group: scaling_group.clone(),
                    health: InstanceHealth::new(inst.instance_status, inst.system_status),
                })?;
            }
            info!(
                cluster = %spec.cluster,
                node_group = %spec.id,
                instances = spec.instances.len(),
                "node group seeded"
            );
        }
        Ok(self.node_groups.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[node_groups]]
cluster = "prod"
id = "ng-a"
min = 2
desired = 2
max = 5

[[node_groups.instances]]
id = "i-1"

[[node_groups.instances]]
id = "i-2"
system_status = "impaired"

[[node_groups]]
cluster = "prod"
id = "ng-b"
scaling_group = "eks-ng-b-7f3a"
min = 1
desired = 3
max = 3
"#;

    #[test]
    fn parse_and_apply() {
        let topology: Topology = toml::from_str(SAMPLE).unwrap();
        let store = StateStore::open_in_memory().unwrap();
        assert_eq!(topology.apply(&store).unwrap(), 2);

        let ng_a = store.get_node_group("prod", "ng-a").unwrap().unwrap();
        assert_eq!(ng_a.scaling_group, "ng-a-asg");
        assert_eq!(ng_a.bounds, ScalingBounds::new(2, 2, 5));

        let sg = store.get_scaling_group("ng-a-asg").unwrap().unwrap();
        assert_eq!(sg.instances, vec!["i-1".to_string(), "i-2".to_string()]);

        let i2 = store.get_instance("i-2").unwrap().unwrap();
        assert_eq!(i2.health.instance_status, HealthFacet::Ok);
        assert_eq!(i2.health.system_status, HealthFacet::Impaired);

        let ng_b = store.get_node_group("prod", "ng-b").unwrap().unwrap();
        assert_eq!(ng_b.scaling_group, "eks-ng-b-7f3a");
    }

    #[test]
    fn apply_rejects_invalid_bounds() {
        let topology = Topology {
            node_groups: vec![NodeGroupSpec {
                cluster: "prod".to_string(),
                id: "ng-bad".to_string(),
                scaling_group: None,
                min: 3,
                desired: 1,
                max: 5,
                instances: Vec::new(),
            }],
        };
        let store = StateStore::open_in_memory().unwrap();
        let err = topology.apply(&store).unwrap_err();
        assert!(matches!(err, StateError::Invalid(_)));
        assert!(store.get_node_group("prod", "ng-bad").unwrap().is_none());
    }
}
