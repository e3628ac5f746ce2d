//! Notification text rendering
//!
//! Messages are plain text so any transport can carry them. Each section
//! lists at most `max_listed` rooms to keep chat messages short.

use crate::config::NotifyConfig;
use crate::model::Attributes;
use crate::reconcile::diff::{DiffEvent, Reconciliation};
use std::collections::BTreeSet;

const MISSING: &str = "(none)";

/// Rendering options
#[derive(Debug, Clone)]
pub struct MessageOptions {
    /// Header title, e.g. "UR監視"
    pub title: String,

    /// Property URL appended as the last line
    pub link: Option<String>,

    /// Rooms listed per section before summarizing the rest
    pub max_listed: usize,
}

impl MessageOptions {
    pub fn from_config(notify: &NotifyConfig, link: impl Into<String>) -> Self {
        Self {
            title: notify.title.clone(),
            link: Some(link.into()),
            max_listed: notify.max_listed.max(1),
        }
    }
}

/// Renders the notification for a reconciliation
///
/// Returns None when there is nothing to say (no events on a non-first run).
pub fn render(reconciliation: &Reconciliation, options: &MessageOptions) -> Option<String> {
    let mut lines = Vec::new();

    match reconciliation {
        Reconciliation::Initialized { room_count } => {
            lines.push(format!("[{} initialized] rooms: {}", options.title, room_count));
        }
        Reconciliation::Events(events) if events.is_empty() => return None,
        Reconciliation::Events(events) => {
            let (appeared, changed, disappeared) = reconciliation.counts();
            lines.push(format!(
                "[{} changes] {} appeared, {} changed, {} disappeared",
                options.title, appeared, changed, disappeared
            ));

            let mut appeared_lines = Vec::new();
            let mut changed_lines = Vec::new();
            let mut disappeared_lines = Vec::new();
            for event in events {
                match event {
                    DiffEvent::Appeared(record) => appeared_lines.push(format!("+ {}", record)),
                    DiffEvent::Changed { label, old, new, .. } => {
                        changed_lines.push(format!("~ {}: {}", label, describe_change(old, new)))
                    }
                    DiffEvent::Disappeared(record) => {
                        disappeared_lines.push(format!("- {}", record))
                    }
                }
            }

            for section in [appeared_lines, changed_lines, disappeared_lines] {
                push_capped(&mut lines, section, options.max_listed);
            }
        }
    }

    if let Some(link) = &options.link {
        lines.push(link.clone());
    }

    Some(lines.join("\n"))
}

/// Renders the short report sent when every page failed
pub fn render_failure(failed_pages: &[u32], options: &MessageOptions) -> String {
    let pages = failed_pages
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let mut message = format!(
        "[{} error] all pages failed to fetch ({}); keeping last known state",
        options.title, pages
    );
    if let Some(link) = &options.link {
        message.push('\n');
        message.push_str(link);
    }
    message
}

/// `key: old → new` pairs for every differing key
fn describe_change(old: &Attributes, new: &Attributes) -> String {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    keys.into_iter()
        .map(|key| {
            format!(
                "{} {} → {}",
                key,
                old.get(key).map(String::as_str).unwrap_or(MISSING),
                new.get(key).map(String::as_str).unwrap_or(MISSING)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_capped(lines: &mut Vec<String>, section: Vec<String>, max_listed: usize) {
    let total = section.len();
    lines.extend(section.into_iter().take(max_listed));
    if total > max_listed {
        lines.push(format!("  … and {} more", total - max_listed));
    }
}
