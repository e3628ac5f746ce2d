//! Run report returned by every completed run

use crate::reconcile::Reconciliation;
use std::fmt;

/// What the reconciliation concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// First run: baseline established
    Initialized { rooms: usize },

    /// At least one room appeared, changed or disappeared
    Changed {
        appeared: usize,
        changed: usize,
        disappeared: usize,
    },

    /// Nothing changed since the last run
    Unchanged,
}

impl From<&Reconciliation> for RunOutcome {
    fn from(reconciliation: &Reconciliation) -> Self {
        match reconciliation {
            Reconciliation::Initialized { room_count } => Self::Initialized { rooms: *room_count },
            Reconciliation::Events(events) if events.is_empty() => Self::Unchanged,
            Reconciliation::Events(_) => {
                let (appeared, changed, disappeared) = reconciliation.counts();
                Self::Changed {
                    appeared,
                    changed,
                    disappeared,
                }
            }
        }
    }
}

/// What happened to the notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Nothing to report
    NotNeeded,

    /// Delivered through the named transport
    Sent { transport: &'static str },

    /// Delivery failed (logged, not fatal)
    Failed { error: String },

    /// A message existed but the run was a dry run
    Suppressed,
}

/// Summary of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub pages_requested: usize,

    /// Pages that could not be fetched or decoded
    pub failed_pages: Vec<u32>,

    pub rooms_observed: usize,
    pub outcome: RunOutcome,

    /// Rendered notification text, if any
    pub message: Option<String>,

    pub notification: NotificationStatus,

    /// Whether the snapshot was written to the state store
    pub persisted: bool,
}

impl RunReport {
    /// True when some (but not all) pages failed
    pub fn is_partial(&self) -> bool {
        !self.failed_pages.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} pages ok, {} rooms, ",
            self.pages_requested - self.failed_pages.len(),
            self.pages_requested,
            self.rooms_observed
        )?;

        match self.outcome {
            RunOutcome::Initialized { rooms } => write!(f, "initialized with {} rooms", rooms)?,
            RunOutcome::Changed {
                appeared,
                changed,
                disappeared,
            } => write!(
                f,
                "+{} ~{} -{}",
                appeared, changed, disappeared
            )?,
            RunOutcome::Unchanged => write!(f, "no changes")?,
        }

        match &self.notification {
            NotificationStatus::NotNeeded => {}
            NotificationStatus::Sent { transport } => write!(f, ", notified via {}", transport)?,
            NotificationStatus::Failed { error } => write!(f, ", notification failed: {}", error)?,
            NotificationStatus::Suppressed => write!(f, ", notification suppressed")?,
        }

        if !self.persisted {
            write!(f, ", state not saved")?;
        }
        Ok(())
    }
}
