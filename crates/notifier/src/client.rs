// crates/notifier/src/client.rs
//! HTTP delivery: a single globally rate-limited sender with retry and
//! backoff, talking to a Telegram-shaped bot API (`POST /sendMessage`).

use std::sync::Arc;
use std::time::Duration;

use activity_types::AlertLevel;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::alert::Alert;

const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;
const TRUNCATION_MARKER: &str = "\n\n... *[Message truncated]*";
const MIN_SEND_INTERVAL: Duration = Duration::from_millis(100);
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_MIN: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Configuration for the chat notifier. `bot_token`/`chat_id` absent
/// means the notifier is disabled entirely.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub base_url: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub thread_id: Option<i64>,
    pub environment: String,
    pub max_message_length: usize,
}

impl NotifierConfig {
    pub fn is_enabled(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

struct RateLimiter {
    last_sent: Mutex<Option<Instant>>,
}

impl RateLimiter {
    fn new() -> Self {
        Self { last_sent: Mutex::new(None) }
    }

    async fn wait(&self) {
        let mut last_sent = self.last_sent.lock().await;
        if let Some(last) = *last_sent {
            let elapsed = last.elapsed();
            if elapsed < MIN_SEND_INTERVAL {
                tokio::time::sleep(MIN_SEND_INTERVAL - elapsed).await;
            }
        }
        *last_sent = Some(Instant::now());
    }
}

/// A disabled notifier no-ops every send, returning `false`. An enabled
/// notifier delivers over HTTPS with global rate limiting and retry.
pub enum Notifier {
    Enabled(ChatNotifier),
    Disabled,
}

impl Notifier {
    pub fn new(config: NotifierConfig, http: reqwest::Client) -> Self {
        if config.is_enabled() {
            Notifier::Enabled(ChatNotifier::new(config, http))
        } else {
            Notifier::Disabled
        }
    }

    pub async fn send_alert(&self, alert: &Alert) -> bool {
        match self {
            Notifier::Enabled(notifier) => notifier.send_alert(alert).await,
            Notifier::Disabled => false,
        }
    }

    /// Sends free-form text bypassing the structured `Alert` envelope,
    /// used by the batched alert collector's aggregated summary.
    pub async fn send_message(&self, text: &str, disable_notification: bool) -> bool {
        match self {
            Notifier::Enabled(notifier) => notifier.send_message(text, disable_notification).await,
            Notifier::Disabled => false,
        }
    }
}

pub struct ChatNotifier {
    config: NotifierConfig,
    http: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl ChatNotifier {
    pub fn new(config: NotifierConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }

    pub async fn send_alert(&self, alert: &Alert) -> bool {
        let text = alert.render(&self.config.environment, Utc::now());
        self.send_message(&text, alert.disable_notification()).await
    }

    pub async fn send_message(&self, text: &str, disable_notification: bool) -> bool {
        let (Some(bot_token), Some(chat_id)) = (&self.config.bot_token, &self.config.chat_id) else {
            return false;
        };

        let max_length = if self.config.max_message_length > 0 {
            self.config.max_message_length
        } else {
            DEFAULT_MAX_MESSAGE_LENGTH
        };
        let text = truncate_message(text, max_length);

        let url = format!("{}/bot{}/sendMessage", self.config.base_url, bot_token);
        let mut payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
            "disable_notification": disable_notification,
        });
        if let Some(thread_id) = self.config.thread_id {
            payload["message_thread_id"] = serde_json::json!(thread_id);
        }

        let mut backoff = BACKOFF_MIN;
        for attempt in 1..=MAX_ATTEMPTS {
            self.rate_limiter.wait().await;

            let response = self.http.post(&url).json(&payload).send().await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return true;
                    }
                    if status.as_u16() == 429 {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .map(Duration::from_secs)
                            .unwrap_or(DEFAULT_RETRY_AFTER);
                        tracing::warn!(retry_after_secs = retry_after.as_secs(), "chat API rate limited, backing off");
                        tokio::time::sleep(retry_after).await;
                        continue;
                    }
                    if status.is_client_error() {
                        tracing::warn!(%status, "chat API rejected message, not retrying");
                        return false;
                    }
                    tracing::warn!(%status, attempt, "chat API server error, retrying");
                }
                Err(err) => {
                    tracing::warn!(%err, attempt, "chat API transport error, retrying");
                }
            }

            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(BACKOFF_MAX);
            }
        }
        false
    }
}

fn truncate_message(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let budget = max_length.saturating_sub(TRUNCATION_MARKER.chars().count());
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{TRUNCATION_MARKER}")
}

/// The severity a notifier call is logged at, re-exported for callers
/// that just want to pick a level without depending on `activity-types`
/// directly.
pub type Level = AlertLevel;

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: String) -> NotifierConfig {
        NotifierConfig {
            base_url,
            bot_token: Some("test-token".to_string()),
            chat_id: Some("12345".to_string()),
            thread_id: None,
            environment: "production".to_string(),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }

    #[test]
    fn truncate_message_adds_marker_when_over_budget() {
        let text = "x".repeat(5000);
        let truncated = truncate_message(&text, 4000);
        assert!(truncated.len() <= 4000 + TRUNCATION_MARKER.len());
        assert!(truncated.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn truncate_message_leaves_short_text_untouched() {
        assert_eq!(truncate_message("hello", 4000), "hello");
    }

    #[tokio::test]
    async fn disabled_notifier_never_sends() {
        let notifier = Notifier::new(
            NotifierConfig {
                base_url: "https://example.invalid".to_string(),
                bot_token: None,
                chat_id: None,
                thread_id: None,
                environment: "production".to_string(),
                max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            },
            reqwest::Client::new(),
        );
        let alert = Alert::new("t", "m", AlertLevel::Warning);
        assert!(!notifier.send_alert(&alert).await);
    }

    #[tokio::test]
    async fn successful_delivery_returns_true() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Regex(r"^/bottest-token/sendMessage$".to_string()))
            .with_status(200)
            .with_body("{\"ok\":true}")
            .create_async()
            .await;

        let notifier = ChatNotifier::new(config(server.url()), reqwest::Client::new());
        assert!(notifier.send_message("hello", false).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_error_fails_without_retrying() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Regex(r"^/bottest-token/sendMessage$".to_string()))
            .with_status(400)
            .expect(1)
            .create_async()
            .await;

        let notifier = ChatNotifier::new(config(server.url()), reqwest::Client::new());
        assert!(!notifier.send_message("hello", false).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_retried_up_to_the_attempt_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Regex(r"^/bottest-token/sendMessage$".to_string()))
            .with_status(500)
            .expect(MAX_ATTEMPTS as usize)
            .create_async()
            .await;

        let notifier = ChatNotifier::new(config(server.url()), reqwest::Client::new());
        assert!(!notifier.send_message("hello", false).await);
        mock.assert_async().await;
    }
}
