use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::EmailConfig;
use crate::constants::http::REQUEST_TIMEOUT;
use crate::error::NotifyError;

use super::escape_html;
use super::traits::{NotifyResult, Notifier};

const CHANNEL: &str = "email";

/// Resend transactional email channel.
#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    config: EmailConfig,
}

impl ResendClient {
    pub fn new(config: EmailConfig) -> NotifyResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }
}

/// Body is kept verbatim inside a fixed-width block.
pub fn render_html(body: &str) -> String {
    format!("<pre>{}</pre>", escape_html(body))
}

#[async_trait]
impl Notifier for ResendClient {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn send(&self, subject: &str, body: &str) -> NotifyResult<()> {
        if !self.config.enabled {
            return Err(NotifyError::Disabled { channel: CHANNEL });
        }
        if !self.config.is_configured() {
            return Err(NotifyError::NotConfigured { channel: CHANNEL });
        }

        let payload = json!({
            "from": self.config.from,
            "to": [self.config.to],
            "subject": subject,
            "html": render_html(body),
        });

        let resp = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(NotifyError::Api {
            channel: CHANNEL,
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        })
    }
}
