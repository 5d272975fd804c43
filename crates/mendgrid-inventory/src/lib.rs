//! mendgrid-inventory — control-plane contracts for the recovery dispatcher.
//!
//! Two seams separate the dispatcher from the infrastructure it repairs:
//!
//! ```text
//! InventoryReader   (read-only)
//!   ├── list_node_groups(cluster)
//!   ├── describe_node_group(cluster, id)
//!   ├── describe_scaling_group(id)
//!   └── instance_health(ids)
//!
//! ScalingControl    (mutation requests)
//!   ├── terminate_instance(id, decrement_desired)
//!   └── update_node_group_scaling(cluster, id, bounds)
//! ```
//!
//! Both are object-safe so the dispatcher can hold `Arc<dyn ...>` and tests
//! can substitute fakes. `Bounded` wraps either one with a per-call timeout.

pub mod client;
pub mod error;
pub mod timeout;

pub use client::{BoxFuture, InventoryReader, ScalingControl};
pub use error::{LookupError, LookupResult, MutationError, MutationResult};
pub use timeout::Bounded;
