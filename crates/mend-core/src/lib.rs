//! mend-core — shared types for the mendgrid recovery dispatcher.
//!
//! Holds the data model that flows between the crates (alarms, cluster
//! topology, recovery results), the inbound notification envelope parser,
//! and the invocation configuration.

pub mod config;
pub mod error;
pub mod event;
pub mod types;

pub use config::{RecoveryConfig, parse_duration};
pub use error::{InputError, InputResult};
pub use event::parse_batch;
pub use types::*;
