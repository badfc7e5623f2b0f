use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{self, PLACEHOLDER_MARKER};
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub hard_stop_multiplier: f64,
    pub warning_multiplier: f64,
    pub profit_target_multiplier: f64,
    pub recommendation_pullback_percent: f64,
    pub recommendation_rsi_max: f64,
    pub recommendation_min_price: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            hard_stop_multiplier: constants::rules::HARD_STOP_MULTIPLIER,
            warning_multiplier: constants::rules::WARNING_MULTIPLIER,
            profit_target_multiplier: constants::rules::PROFIT_TARGET_MULTIPLIER,
            recommendation_pullback_percent: constants::rules::RECOMMENDATION_PULLBACK_PERCENT,
            recommendation_rsi_max: constants::rules::RECOMMENDATION_RSI_MAX,
            recommendation_min_price: constants::rules::RECOMMENDATION_MIN_PRICE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub timezone: Tz,
    pub open_hour: u32,
    pub open_minute: u32,
    pub close_hour: u32,
    pub close_minute: u32,
    pub holidays: Vec<NaiveDate>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            timezone: constants::market::TIMEZONE,
            open_hour: constants::market::OPEN_HOUR,
            open_minute: constants::market::OPEN_MINUTE,
            close_hour: constants::market::CLOSE_HOUR,
            close_minute: constants::market::CLOSE_MINUTE,
            holidays: constants::market::DEFAULT_HOLIDAYS
                .iter()
                .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .collect(),
        }
    }
}

impl MarketConfig {
    pub fn open_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.open_hour, self.open_minute, 0)
    }

    pub fn close_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.close_hour, self.close_minute, 0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub check_interval_minutes: u64,
    pub daily_summary_hour: u32,
    pub daily_summary_minute: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: constants::schedule::CHECK_INTERVAL_MINUTES,
            daily_summary_hour: constants::schedule::DAILY_SUMMARY_HOUR,
            daily_summary_minute: constants::schedule::DAILY_SUMMARY_MINUTE,
        }
    }
}

impl ScheduleConfig {
    pub fn summary_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.daily_summary_hour, self.daily_summary_minute, 0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub enable_watchlist_scanning: bool,
    /// Treats the market as always open
    pub testing_mode: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_to_file: bool,
    pub log_file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_to_file: false,
            log_file: PathBuf::from(constants::paths::LOG_FILE),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    pub base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_token: String::new(),
            chat_id: String::new(),
            base_url: constants::http::TELEGRAM_API_BASE_URL.to_string(),
        }
    }
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        is_set(&self.bot_token) && is_set(&self.chat_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub api_key: String,
    pub from: String,
    pub to: String,
    pub api_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            from: String::new(),
            to: String::new(),
            api_url: constants::http::RESEND_API_URL.to_string(),
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        is_set(&self.api_key) && is_set(&self.from) && is_set(&self.to)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub base_url: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: constants::http::YAHOO_CHART_BASE_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: constants::paths::WEB_BIND.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rules: RuleConfig,
    pub market: MarketConfig,
    pub schedule: ScheduleConfig,
    pub features: FeatureConfig,
    pub logging: LoggingConfig,
    pub telegram: TelegramConfig,
    pub email: EmailConfig,
    pub data: DataConfig,
    pub web: WebConfig,
}

impl AppConfig {
    /// Reads the file, overlays secrets from the environment and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses the file as written, without environment secrets. Used when the
    /// file is going to be written back.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Credentials normally live in `.env`, not in the YAML file.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = v;
        }
        if let Some(v) = get("RESEND_API_KEY") {
            self.email.api_key = v;
        }
        if let Some(v) = get("EMAIL_FROM") {
            self.email.from = v;
        }
        if let Some(v) = get("EMAIL_TO") {
            self.email.to = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.rules;
        for (name, value) in [
            ("hard_stop_multiplier", r.hard_stop_multiplier),
            ("warning_multiplier", r.warning_multiplier),
            ("profit_target_multiplier", r.profit_target_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, value)));
            }
        }
        if r.hard_stop_multiplier >= r.warning_multiplier {
            return Err(ConfigError::Invalid(format!(
                "hard_stop_multiplier ({}) must be below warning_multiplier ({})",
                r.hard_stop_multiplier, r.warning_multiplier
            )));
        }
        if r.profit_target_multiplier <= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "profit_target_multiplier must be above 1.0, got {}",
                r.profit_target_multiplier
            )));
        }
        if !(r.recommendation_pullback_percent >= 0.0 && r.recommendation_pullback_percent < 100.0) {
            return Err(ConfigError::Invalid(format!(
                "recommendation_pullback_percent must be in [0, 100), got {}",
                r.recommendation_pullback_percent
            )));
        }
        if !(r.recommendation_rsi_max > 0.0 && r.recommendation_rsi_max <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "recommendation_rsi_max must be in (0, 100], got {}",
                r.recommendation_rsi_max
            )));
        }

        let (open, close) = match (self.market.open_time(), self.market.close_time()) {
            (Some(o), Some(c)) => (o, c),
            _ => return Err(ConfigError::Invalid("market open/close time is not a valid clock time".into())),
        };
        if open >= close {
            return Err(ConfigError::Invalid(format!("market open {} must be before close {}", open, close)));
        }
        if self.schedule.summary_time().is_none() {
            return Err(ConfigError::Invalid("daily summary time is not a valid clock time".into()));
        }
        if self.schedule.check_interval_minutes == 0 {
            return Err(ConfigError::Invalid("check_interval_minutes must be at least 1".into()));
        }
        Ok(())
    }
}

/// Empty values and untouched `YOUR_...` placeholders both count as unset
pub fn is_set(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains(PLACEHOLDER_MARKER)
}
