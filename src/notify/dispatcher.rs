use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::alerts::Alert;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::NotifyError;

use super::email::ResendClient;
use super::telegram::TelegramClient;
use super::traits::{NotifyResult, Notifier};

/// Outcome of one send across every channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeliveryReport {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
    pub skipped: Vec<&'static str>,
}

impl DeliveryReport {
    pub fn any_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }

    pub fn delivered_to(&self, channel: &str) -> bool {
        self.delivered.iter().any(|c| *c == channel)
    }
}

/// Fans a message out to every channel independently: one channel failing
/// never stops the others from being attempted.
#[derive(Clone)]
pub struct AlertDispatcher {
    channels: Vec<Arc<dyn Notifier>>,
    clock: Arc<dyn Clock>,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Arc<dyn Notifier>>, clock: Arc<dyn Clock>) -> Self {
        Self { channels, clock }
    }

    /// Telegram first, email second.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> NotifyResult<Self> {
        let telegram = TelegramClient::new(config.telegram.clone())?;
        let email = ResendClient::new(config.email.clone())?;
        let channels: Vec<Arc<dyn Notifier>> = vec![Arc::new(telegram), Arc::new(email)];
        Ok(Self::new(channels, clock))
    }

    fn timestamp(&self) -> String {
        self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub async fn send_alert(&self, alert: &Alert) -> DeliveryReport {
        let message = format!("🚨 TRADING ALERT 🚨\n{}\n\n{}", self.timestamp(), alert.body());
        info!("🚨 [ALERT] {} {}\n{}", alert.kind(), alert.symbol(), message);
        self.broadcast(&alert.subject(), &message).await
    }

    pub async fn send_daily_summary(&self, summary_text: &str) -> DeliveryReport {
        let message = format!("📊 DAILY PORTFOLIO SUMMARY\n{}\n\n{}", self.timestamp(), summary_text);
        info!("📊 [SUMMARY]\n{}", message);
        self.broadcast("📊 Daily Portfolio Summary", &message).await
    }

    pub async fn send_test(&self) -> DeliveryReport {
        let message = format!(
            "✅ Portfolio Alerts Test\n\n\
             This is a test message to verify your notification setup.\n\
             If you received this, everything is working correctly!\n\n\
             Timestamp: {}",
            self.timestamp()
        );
        self.broadcast("Portfolio Alerts - Test Alert", &message).await
    }

    async fn broadcast(&self, subject: &str, message: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for channel in &self.channels {
            match channel.send(subject, message).await {
                Ok(()) => {
                    info!("✅ [NOTIFY] {} notification sent", channel.name());
                    report.delivered.push(channel.name());
                }
                Err(e) if e.is_disabled() => {
                    debug!("[NOTIFY] {} disabled - skipping", channel.name());
                    report.skipped.push(channel.name());
                }
                Err(e) => {
                    log_failure(channel.name(), &e);
                    report.failed.push((channel.name(), e.to_string()));
                }
            }
        }

        report
    }
}

fn log_failure(channel: &str, err: &NotifyError) {
    match err {
        NotifyError::NotConfigured { .. } => warn!("⚠️ [NOTIFY] {} not configured - skipping notification", channel),
        _ => error!("❌ [NOTIFY] {} failed: {}", channel, err),
    }
    if let Some(hint) = err.hint() {
        warn!("💡 [NOTIFY] {}", hint);
    }
}
