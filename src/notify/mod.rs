//! Notification transports
//!
//! The monitor only needs `notify(text) -> ok/failed`. Two transports exist:
//! - `LogNotifier`: writes the message to the log (no credentials configured)
//! - `ChatworkNotifier`: posts the message to a Chatwork room
//!
//! A failed notification is never fatal to a run and is not retried here.

mod chatwork;

pub use chatwork::{ChatworkNotifier, MAX_MESSAGE_CHARS};

use crate::config::NotifyConfig;
use async_trait::async_trait;
use thiserror::Error;

/// Environment variable consulted when `room-id` is not configured
pub const ROOM_ID_ENV: &str = "CHATWORK_ROOM_ID";

/// Errors that can occur while delivering a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport rejected the message with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Capability to deliver a text message
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Notifier that only logs the message
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        tracing::info!("Notification (log only):\n{}", message);
        Ok(())
    }
}

/// Builds the notifier from configuration and the process environment
///
/// Reads the token from `config.token_env` and the room id from
/// `config.room_id` or `CHATWORK_ROOM_ID`. Missing credentials are not an
/// error: the result is a log-only notifier.
pub fn notifier_from_env(config: &NotifyConfig) -> Result<Box<dyn Notifier>, NotifyError> {
    let token = std::env::var(&config.token_env).ok();
    let room_id = config
        .room_id
        .clone()
        .or_else(|| std::env::var(ROOM_ID_ENV).ok());
    build_notifier(config, token, room_id)
}

/// Builds the notifier from explicit credentials
pub fn build_notifier(
    config: &NotifyConfig,
    token: Option<String>,
    room_id: Option<String>,
) -> Result<Box<dyn Notifier>, NotifyError> {
    let token = token.filter(|t| !t.trim().is_empty());
    let room_id = room_id.filter(|r| !r.trim().is_empty());

    match (token, room_id) {
        (Some(token), Some(room_id)) => Ok(Box::new(ChatworkNotifier::new(
            &config.api_base,
            room_id,
            token,
            config.title.clone(),
        )?)),
        (token, room_id) => {
            tracing::info!(
                "Notification credentials incomplete (token: {}, room: {}); logging messages only",
                token.is_some(),
                room_id.is_some()
            );
            Ok(Box::new(LogNotifier))
        }
    }
}
