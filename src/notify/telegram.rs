use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::TelegramConfig;
use crate::constants::http::REQUEST_TIMEOUT;
use crate::error::NotifyError;

use super::escape_html;
use super::traits::{NotifyResult, Notifier};

const CHANNEL: &str = "telegram";

/// Telegram Bot API chat channel.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

#[derive(Deserialize, Debug)]
struct ApiResponse {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> NotifyResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// Numeric ids go out as integers, `@channel` names as strings.
    fn chat_id(&self) -> Value {
        match self.config.chat_id.trim().parse::<i64>() {
            Ok(id) => json!(id),
            Err(_) => json!(self.config.chat_id.trim()),
        }
    }

    fn ensure_ready(&self) -> NotifyResult<()> {
        if !self.config.enabled {
            return Err(NotifyError::Disabled { channel: CHANNEL });
        }
        if !self.config.is_configured() {
            return Err(NotifyError::NotConfigured { channel: CHANNEL });
        }
        Ok(())
    }

    /// Sends `text` with HTML parse mode; the text is escaped first.
    pub async fn send_text(&self, text: &str) -> NotifyResult<()> {
        self.ensure_ready()?;

        let payload = json!({
            "chat_id": self.chat_id(),
            "text": escape_html(text),
            "parse_mode": "HTML",
        });

        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &body))
    }

    /// Confirms the token resolves to a bot and the bot can see the chat.
    /// Returns the bot's username.
    pub async fn verify(&self) -> NotifyResult<String> {
        if !self.config.is_configured() {
            return Err(NotifyError::NotConfigured { channel: CHANNEL });
        }

        let resp = self.client.get(self.method_url("getMe")).send().await?;
        if !resp.status().is_success() {
            return Err(NotifyError::Unauthorized);
        }
        let me: ApiResponse = resp.json().await?;
        let username = me
            .result
            .as_ref()
            .and_then(|r| r.get("username"))
            .and_then(|u| u.as_str())
            .unwrap_or("Unknown")
            .to_string();
        info!("✅ [TELEGRAM] Bot found: @{}", username);

        let resp = self
            .client
            .post(self.method_url("getChat"))
            .json(&json!({ "chat_id": self.chat_id() }))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            info!("✅ [TELEGRAM] Chat ID verified: {}", self.config.chat_id);
            return Ok(username);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &body))
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn send(&self, _subject: &str, body: &str) -> NotifyResult<()> {
        self.send_text(body).await
    }
}

/// Maps a non-2xx Bot API reply to the failure users can act on.
pub fn classify_error(status: u16, body: &str) -> NotifyError {
    let description = serde_json::from_str::<ApiResponse>(body)
        .ok()
        .and_then(|r| r.description)
        .unwrap_or_else(|| body.to_string());
    let lower = description.to_lowercase();

    if lower.contains("chat not found") {
        NotifyError::ChatNotFound
    } else if lower.contains("unauthorized") {
        NotifyError::Unauthorized
    } else {
        NotifyError::Api {
            channel: CHANNEL,
            status,
            body: description,
        }
    }
}
