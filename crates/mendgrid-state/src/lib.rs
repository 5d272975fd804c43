//! mendgrid-state — local control plane for the recovery dispatcher.
//!
//! Backed by [redb](https://docs.rs/redb), holds node groups, scaling
//! groups, instance health and an append-only log of every mutation
//! request it has applied. `StateStore` implements both
//! `InventoryReader` and `ScalingControl`, so the dispatcher can run
//! against it directly (daemon, integration tests) or against any other
//! control-plane client behind the same traits.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Node groups use composite keys (`{cluster}/{node_group}`) so a cluster's
//! groups are a prefix scan. Mutations are keyed by a monotonically
//! increasing sequence number.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod control;
pub mod error;
pub mod store;
pub mod tables;
pub mod topology;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use topology::Topology;
pub use types::*;
