//! Application-wide constants and magic numbers
//!
//! Rule defaults, indicator windows and external endpoints live here so the
//! config layer and the engine agree on the same values.

use std::time::Duration;

/// Default alert thresholds
pub mod rules {
    /// Sell-now threshold as a fraction of average cost
    pub const HARD_STOP_MULTIPLIER: f64 = 0.91;

    /// Early-warning threshold as a fraction of average cost
    pub const WARNING_MULTIPLIER: f64 = 0.95;

    /// Take-profit threshold as a fraction of average cost
    pub const PROFIT_TARGET_MULTIPLIER: f64 = 1.30;

    /// Minimum pullback (percent) from the 52-week high for a buy signal
    pub const RECOMMENDATION_PULLBACK_PERCENT: f64 = 8.0;

    /// RSI ceiling for a buy signal (exclusive)
    pub const RECOMMENDATION_RSI_MAX: f64 = 65.0;

    /// Ignore watchlist names trading below this price
    pub const RECOMMENDATION_MIN_PRICE: f64 = 10.0;

    /// SMA breach checks only run on Fridays at or after this local hour
    pub const SMA_BREACH_MIN_HOUR: u32 = 16;
}

/// Indicator windows
pub mod indicators {
    pub const SMA_LONG_WINDOW: usize = 200;
    pub const SMA_SHORT_WINDOW: usize = 50;
    pub const RSI_PERIOD: usize = 14;

    /// Returned whenever RSI cannot be computed
    pub const RSI_NEUTRAL: f64 = 50.0;
}

/// Scheduling defaults
pub mod schedule {
    pub const CHECK_INTERVAL_MINUTES: u64 = 5;
    pub const DAILY_SUMMARY_HOUR: u32 = 17;
    pub const DAILY_SUMMARY_MINUTE: u32 = 0;

    /// Fires once per minute at second zero, so exact-minute matches are never skipped
    pub const EVERY_MINUTE_CRON: &str = "0 * * * * *";
}

/// Market calendar defaults (NYSE)
pub mod market {
    pub const TIMEZONE: chrono_tz::Tz = chrono_tz::America::New_York;
    pub const OPEN_HOUR: u32 = 9;
    pub const OPEN_MINUTE: u32 = 30;
    pub const CLOSE_HOUR: u32 = 16;
    pub const CLOSE_MINUTE: u32 = 0;

    /// Full-day NYSE closures used when the config file lists none
    pub const DEFAULT_HOLIDAYS: &[&str] = &[
        "2025-01-01",
        "2025-01-20",
        "2025-02-17",
        "2025-04-18",
        "2025-05-26",
        "2025-06-19",
        "2025-07-04",
        "2025-09-01",
        "2025-11-27",
        "2025-12-25",
    ];
}

/// Outbound HTTP
pub mod http {
    use super::*;

    /// Every outbound call is bounded by this timeout
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
    pub const TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";
    pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

    /// Yahoo rejects requests without a browser-like agent
    pub const USER_AGENT: &str = "Mozilla/5.0 (portfolio_alerts)";
}

/// File locations
pub mod paths {
    pub const CONFIG_FILE: &str = "config.yaml";
    pub const PORTFOLIO_FILE: &str = "portfolio.yaml";
    pub const LOG_FILE: &str = "logs/portfolio_alerts.log";
    pub const WEB_BIND: &str = "127.0.0.1:5000";
}

/// Credentials that still contain this marker are treated as unset
pub const PLACEHOLDER_MARKER: &str = "YOUR_";
