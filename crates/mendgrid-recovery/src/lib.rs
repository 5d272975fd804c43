//! mendgrid-recovery — alarm-triggered auto-recovery.
//!
//! # Pipeline
//!
//! ```text
//! alarm batch
//!   │
//!   ▼
//! RecoveryDispatcher ── state != ALARM ──▶ Skipped (logged only)
//!   │
//!   ├── classify(name)            → ActionTag
//!   ├── actions::execute(tag)     → reads InventoryReader,
//!   │                               requests ScalingControl mutations
//!   ├── RecoveryResult            (success flag + detail)
//!   └── Notifier::notify()        → report, failures swallowed
//! ```
//!
//! Every action returns a `RecoveryResult`; lookup and mutation failures
//! are folded into it. The only error that escapes the dispatcher is a
//! malformed batch (`InputError`).

pub mod actions;
pub mod classifier;
pub mod dispatcher;

#[cfg(test)]
mod testing;

pub use actions::Remediation;
pub use classifier::{RULES, Rule, classify};
pub use dispatcher::{DispatchOutcome, RecoveryDispatcher};
