//! mendgrid-notify — recovery outcome reports.
//!
//! Every firing alarm the dispatcher processes produces one report:
//!
//! ```text
//! Notifier::notify(alarm, result)
//!   ├── no channel configured → warn, return
//!   ├── Report::render()      → subject + body
//!   └── channel.publish()     → error logged and swallowed
//! ```
//!
//! Notification failure never surfaces as an invocation failure, so
//! `notify` returns `()`.

pub mod channel;
pub mod error;
pub mod notifier;
pub mod report;

pub use channel::{NotificationChannel, WebhookChannel};
pub use error::NotifyError;
pub use notifier::Notifier;
pub use report::Report;
