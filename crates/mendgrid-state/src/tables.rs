//! redb table definitions for the mendgrid state store.

use redb::TableDefinition;

/// Node groups keyed by `{cluster}/{node_group}`.
pub const NODE_GROUPS: TableDefinition<&str, &[u8]> = TableDefinition::new("node_groups");

/// Scaling groups keyed by `{scaling_group}`.
pub const SCALING_GROUPS: TableDefinition<&str, &[u8]> = TableDefinition::new("scaling_groups");

/// Instance records keyed by `{instance_id}`.
pub const INSTANCES: TableDefinition<&str, &[u8]> = TableDefinition::new("instances");

/// Applied mutation requests keyed by sequence number.
pub const MUTATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("mutations");
