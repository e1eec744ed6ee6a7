//! Alert delivery over the Telegram bot API.

use reqwest::Client as HttpClient;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use vigil_core::{Result, VigilError};

/// Default Telegram API host
const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Default alert POST timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends formatted alert messages to one chat (optionally one topic thread)
#[derive(Clone)]
pub struct TelegramNotifier {
    http: HttpClient,
    base_url: String,
    token: String,
    chat_id: String,
    topic_id: Option<i64>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
}

impl TelegramNotifier {
    /// Create a notifier with default settings
    #[must_use]
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        TelegramNotifierBuilder::new(token, chat_id).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> TelegramNotifierBuilder {
        TelegramNotifierBuilder::new(token, chat_id)
    }

    /// Deliver one HTML-formatted message.
    ///
    /// A non-2xx response is an error: a failed alert is itself an
    /// operational concern and must fail the domain's tick.
    pub async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            message_thread_id: self.topic_id,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VigilError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(chat_id = %self.chat_id, bytes = text.len(), "alert delivered");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(VigilError::Alert {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Builder for configuring a [`TelegramNotifier`]
pub struct TelegramNotifierBuilder {
    base_url: String,
    token: String,
    chat_id: String,
    topic_id: Option<i64>,
    timeout: Duration,
}

impl TelegramNotifierBuilder {
    /// Create a builder with the given bot token and chat id
    #[must_use]
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            topic_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the API base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Address a forum topic thread inside the chat
    #[must_use]
    pub const fn topic_id(mut self, topic_id: Option<i64>) -> Self {
        self.topic_id = topic_id;
        self
    }

    /// Set the POST timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the notifier
    #[must_use]
    pub fn build(self) -> TelegramNotifier {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client with static settings");

        TelegramNotifier {
            http,
            base_url: self.base_url,
            token: self.token,
            chat_id: self.chat_id,
            topic_id: self.topic_id,
        }
    }
}
