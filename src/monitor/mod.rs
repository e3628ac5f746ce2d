//! Monitor module - run orchestration
//!
//! This module ties the capabilities together:
//! - `Monitor`: one fetch → reconcile → notify → persist run
//! - `RunReport`: what a run observed and did
//! - `MonitoringWindow`: business-hours gate used by the binary

mod coordinator;
mod report;
mod window;

pub use coordinator::Monitor;
pub use report::{NotificationStatus, RunOutcome, RunReport};
pub use window::MonitoringWindow;

use crate::config::Config;
use crate::WatchError;

/// Runs a single monitoring pass for a validated configuration
///
/// This is the main entry point used by the binary. It will:
/// 1. Build the page fetcher, state store and notifier
/// 2. Fetch and extract every configured page
/// 3. Reconcile against the last snapshot and notify about the delta
/// 4. Persist the new snapshot
///
/// # Returns
///
/// * `Ok(RunReport)` - The run completed
/// * `Err(WatchError)` - Setup failed, every page failed, or state could not be saved
pub async fn run_once(config: &Config, dry_run: bool) -> Result<RunReport, WatchError> {
    let mut monitor = Monitor::from_config(config)?.with_dry_run(dry_run);
    monitor.run().await
}
