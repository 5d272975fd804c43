//! mendd — the mendgrid recovery daemon.
//!
//! Assembles the dispatcher from layered configuration and the local
//! control plane, and exposes it either as a one-shot invocation or as an
//! HTTP trigger.

pub mod runtime;
pub mod settings;
pub mod trigger;

pub use runtime::{build_dispatcher, open_store};
pub use settings::ConfigArgs;
pub use trigger::RecoveryTrigger;
