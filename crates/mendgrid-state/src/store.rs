//! redb-backed local control plane.
//!
//! Provides typed CRUD over node groups, scaling groups and instances,
//! plus the two mutations the recovery dispatcher can request. Each
//! mutation is applied in a single write transaction together with its
//! mutation-log entry. The store supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, Table, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use mend_core::{NodeGroup, ScalingBounds, ScalingGroup};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(NODE_GROUPS).map_err(map_err!(Table))?;
        txn.open_table(SCALING_GROUPS).map_err(map_err!(Table))?;
        txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        txn.open_table(MUTATIONS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Node groups ────────────────────────────────────────────────

    /// Insert or update a node group.
    pub fn put_node_group(&self, group: &NodeGroup) -> StateResult<()> {
        let key = group.table_key();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(NODE_GROUPS).map_err(map_err!(Table))?;
            write_json(&mut table, &key, group)?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "node group stored");
        Ok(())
    }

    pub fn get_node_group(&self, cluster: &str, id: &str) -> StateResult<Option<NodeGroup>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(NODE_GROUPS).map_err(map_err!(Table))?;
        read_json(&table, &format!("{cluster}/{id}"))
    }

    /// List all node groups of a cluster, ordered by id.
    pub fn list_node_groups(&self, cluster: &str) -> StateResult<Vec<NodeGroup>> {
        let prefix = format!("{cluster}/");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(NODE_GROUPS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let group: NodeGroup =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                // "a/" also prefixes the keys of cluster "a/b".
                if group.cluster == cluster {
                    results.push(group);
                }
            }
        }
        Ok(results)
    }

    /// Delete a node group. Returns true if it existed.
    pub fn delete_node_group(&self, cluster: &str, id: &str) -> StateResult<bool> {
        let key = format!("{cluster}/{id}");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(NODE_GROUPS).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "node group deleted");
        Ok(existed)
    }

    // ── Scaling groups ─────────────────────────────────────────────

    pub fn put_scaling_group(&self, group: &ScalingGroup) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SCALING_GROUPS).map_err(map_err!(Table))?;
            write_json(&mut table, &group.id, group)?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    pub fn get_scaling_group(&self, id: &str) -> StateResult<Option<ScalingGroup>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SCALING_GROUPS).map_err(map_err!(Table))?;
        read_json(&table, id)
    }

    pub fn delete_scaling_group(&self, id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(SCALING_GROUPS).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    // ── Instances ──────────────────────────────────────────────────

    /// Insert or update an instance record (including its health).
    pub fn put_instance(&self, instance: &InstanceRecord) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
            write_json(&mut table, &instance.id, instance)?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    pub fn get_instance(&self, id: &str) -> StateResult<Option<InstanceRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        read_json(&table, id)
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Terminate an instance and drop it from its scaling group.
    ///
    /// Returns `None` if the instance does not exist. Desired capacity is
    /// only lowered (never below min) when `decrement_desired` is set.
    pub fn terminate_instance(
        &self,
        instance_id: &str,
        decrement_desired: bool,
    ) -> StateResult<Option<MutationRecord>> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record;
        {
            let mut instances = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
            let Some(instance) = read_json::<InstanceRecord, _>(&instances, instance_id)? else {
                return Ok(None);
            };
            instances.remove(instance_id).map_err(map_err!(Write))?;

            let mut groups = txn.open_table(SCALING_GROUPS).map_err(map_err!(Table))?;
            if let Some(mut group) = read_json::<ScalingGroup, _>(&groups, &instance.scaling_group)? {
                group.instances.retain(|id| id != instance_id);
                if decrement_desired {
                    let lowered = group.bounds.desired.saturating_sub(1).max(group.bounds.min);
                    group.bounds = group.bounds.with_desired(lowered);
                    mirror_to_node_group(&txn, &group.id, group.bounds)?;
                }
                write_json(&mut groups, &group.id, &group)?;
            }

            record = append_mutation(
                &txn,
                Mutation::TerminateInstance {
                    instance_id: instance_id.to_string(),
                    scaling_group: instance.scaling_group,
                    decrement_desired,
                },
            )?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%instance_id, decrement_desired, seq = record.seq, "instance terminated");
        Ok(Some(record))
    }

    /// Replace a node group's scaling bounds and mirror them onto its
    /// scaling group.
    ///
    /// Returns `None` if the node group does not exist. Bounds violating
    /// `min <= desired <= max` are rejected with `StateError::Invalid`.
    pub fn update_node_group_scaling(
        &self,
        cluster: &str,
        node_group: &str,
        bounds: ScalingBounds,
    ) -> StateResult<Option<MutationRecord>> {
        bounds.validate().map_err(StateError::Invalid)?;

        let key = format!("{cluster}/{node_group}");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record;
        {
            let mut table = txn.open_table(NODE_GROUPS).map_err(map_err!(Table))?;
            let Some(mut group) = read_json::<NodeGroup, _>(&table, &key)? else {
                return Ok(None);
            };
            let from = group.bounds;
            group.bounds = bounds;
            write_json(&mut table, &key, &group)?;

            let mut scaling = txn.open_table(SCALING_GROUPS).map_err(map_err!(Table))?;
            if let Some(mut sg) = read_json::<ScalingGroup, _>(&scaling, &group.scaling_group)? {
                sg.bounds = bounds;
                write_json(&mut scaling, &sg.id, &sg)?;
            }

            record = append_mutation(
                &txn,
                Mutation::UpdateScaling {
                    cluster: cluster.to_string(),
                    node_group: node_group.to_string(),
                    from,
                    to: bounds,
                },
            )?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, %bounds, seq = record.seq, "node group scaling updated");
        Ok(Some(record))
    }

    /// All applied mutations, oldest first.
    pub fn list_mutations(&self) -> StateResult<Vec<MutationRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MUTATIONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: MutationRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }
}

fn read_json<T, R>(table: &R, key: &str) -> StateResult<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key).map_err(map_err!(Read))? {
        Some(guard) => {
            let value = serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn write_json<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> StateResult<()> {
    let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
    table
        .insert(key, bytes.as_slice())
        .map_err(map_err!(Write))?;
    Ok(())
}

/// Copy scaling-group bounds back onto the node group that owns it.
fn mirror_to_node_group(
    txn: &WriteTransaction,
    scaling_group: &str,
    bounds: ScalingBounds,
) -> StateResult<()> {
    let mut table = txn.open_table(NODE_GROUPS).map_err(map_err!(Table))?;
    let owners: Vec<NodeGroup> = {
        let mut owners = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let group: NodeGroup =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if group.scaling_group == scaling_group {
                owners.push(group);
            }
        }
        owners
    };
    for mut group in owners {
        group.bounds = bounds;
        write_json(&mut table, &group.table_key(), &group)?;
    }
    Ok(())
}

fn append_mutation(txn: &WriteTransaction, mutation: Mutation) -> StateResult<MutationRecord> {
    let mut table = txn.open_table(MUTATIONS).map_err(map_err!(Table))?;
    let seq = match table.last().map_err(map_err!(Read))? {
        Some((key, _)) => key.value() + 1,
        None => 1,
    };
    let record = MutationRecord {
        seq,
        mutation,
        applied_at: epoch_secs(),
    };
    let bytes = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
    table
        .insert(seq, bytes.as_slice())
        .map_err(map_err!(Write))?;
    Ok(record)
}
