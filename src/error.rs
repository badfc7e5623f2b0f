//! Custom error types for the alerting system
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Market data errors. `NoData` is the ordinary "nothing came back" outcome.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data available for {symbol}")]
    NoData { symbol: String },

    #[error("HTTP {status} fetching {symbol}: {body}")]
    Http {
        symbol: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response for {symbol}: {reason}")]
    Parse { symbol: String, reason: String },
}

/// Notification transport errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("{channel} notifications are disabled")]
    Disabled { channel: &'static str },

    #[error("{channel} credentials are not configured")]
    NotConfigured { channel: &'static str },

    #[error("Chat not found")]
    ChatNotFound,

    #[error("Unauthorized: invalid bot token")]
    Unauthorized,

    #[error("{channel} API error: HTTP {status} - {body}")]
    Api {
        channel: &'static str,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl NotifyError {
    /// Remediation text for the failures users actually hit
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            NotifyError::ChatNotFound => Some(
                "Open Telegram and send your bot a message (e.g. /start) first; \
                 the bot cannot message you until you message it",
            ),
            NotifyError::Unauthorized => Some("Check TELEGRAM_BOT_TOKEN in your .env or config.yaml"),
            NotifyError::NotConfigured { channel: "telegram" } => {
                Some("Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID in your .env")
            }
            NotifyError::NotConfigured { .. } => Some("Set RESEND_API_KEY, EMAIL_FROM and EMAIL_TO in your .env"),
            _ => None,
        }
    }

    /// Disabled channels are skipped quietly, everything else is a real failure
    pub fn is_disabled(&self) -> bool {
        matches!(self, NotifyError::Disabled { .. })
    }
}

/// Holdings/watchlist store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse portfolio file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid symbol: '{symbol}'")]
    InvalidSymbol { symbol: String },

    #[error("Invalid holding {symbol}: shares and avg_cost must be positive")]
    InvalidHolding { symbol: String },

    #[error("{symbol} is already in {list}")]
    Duplicate { symbol: String, list: &'static str },
}

/// Indicator errors
#[derive(Error, Debug, PartialEq)]
pub enum IndicatorError {
    #[error("Not enough data: have {count}, need {required}")]
    InsufficientData { count: usize, required: usize },
}

/// Errors that stop the bot from starting
#[derive(Error, Debug)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}
