//! Chatwork room transport

use crate::notify::{Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Longest message body sent; longer messages are truncated
pub const MAX_MESSAGE_CHARS: usize = 9000;

const TRUNCATED_SUFFIX: &str = "\n…(truncated)";

/// Posts messages to one Chatwork room
pub struct ChatworkNotifier {
    client: Client,
    endpoint: String,
    token: String,
    title: String,
}

impl ChatworkNotifier {
    /// Creates a notifier for `room_id` under `api_base`
    pub fn new(
        api_base: &str,
        room_id: String,
        token: String,
        title: String,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        let endpoint = format!(
            "{}/v2/rooms/{}/messages",
            api_base.trim_end_matches('/'),
            room_id
        );
        Ok(Self {
            client,
            endpoint,
            token,
            title,
        })
    }

    /// Wraps the message in Chatwork's info block markup
    pub fn format_body(&self, message: &str) -> String {
        format!(
            "[info][title]{}[/title]{}[/info]",
            self.title,
            truncate(message, MAX_MESSAGE_CHARS)
        )
    }
}

#[async_trait]
impl Notifier for ChatworkNotifier {
    fn name(&self) -> &'static str {
        "chatwork"
    }

    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let body = self.format_body(message);
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-ChatWorkToken", &self.token)
            .form(&[("body", body.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(120).collect(),
            });
        }

        tracing::info!("Chatwork accepted notification (HTTP {})", status.as_u16());
        Ok(())
    }
}

/// Cuts `message` to `max_chars` characters, marking the cut
fn truncate(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        message.to_string()
    } else {
        let mut cut: String = message.chars().take(max_chars).collect();
        cut.push_str(TRUNCATED_SUFFIX);
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(api_base: &str) -> ChatworkNotifier {
        ChatworkNotifier::new(
            api_base,
            "42".to_string(),
            "secret".to_string(),
            "UR監視".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("号室号室号室", 2), "号室\n…(truncated)");
    }

    #[test]
    fn test_format_body() {
        let body = notifier("https://api.example.com/").format_body("hello");
        assert_eq!(body, "[info][title]UR監視[/title]hello[/info]");
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        assert_eq!(
            notifier("https://api.example.com/").endpoint,
            "https://api.example.com/v2/rooms/42/messages"
        );
    }

    #[tokio::test]
    async fn test_posts_to_room() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/rooms/42/messages"))
            .and(header("X-ChatWorkToken", "secret"))
            .and(body_string_contains("body="))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"message_id":"1"}"#))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server.uri()).notify("rooms changed").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let result = notifier(&server.uri()).notify("hi").await;
        assert!(matches!(
            result,
            Err(NotifyError::Rejected { status: 401, .. })
        ));
    }
}
