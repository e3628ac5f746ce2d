//! Reconciliation of observed rooms against the last snapshot
//!
//! - `diff`/`reconcile`: classify rooms as appeared, changed or disappeared
//! - `render`: build the notification text for a reconciliation

mod diff;
mod message;

pub use diff::{diff, reconcile, DiffEvent, Reconciliation};
pub use message::{render, render_failure, MessageOptions};
