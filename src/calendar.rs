//! Trading-day and market-hours gating.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;
use std::collections::BTreeSet;

use crate::config::MarketConfig;
use crate::constants::rules::SMA_BREACH_MIN_HOUR;
use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct MarketCalendar {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
    holidays: BTreeSet<NaiveDate>,
}

impl MarketCalendar {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            tz,
            open,
            close,
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn from_config(market: &MarketConfig) -> Result<Self, ConfigError> {
        let open = market
            .open_time()
            .ok_or_else(|| ConfigError::Invalid("invalid market open time".into()))?;
        let close = market
            .close_time()
            .ok_or_else(|| ConfigError::Invalid("invalid market close time".into()))?;
        Ok(Self::new(market.timezone, open, close, market.holidays.iter().copied()))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn open_time(&self) -> NaiveTime {
        self.open
    }

    pub fn close_time(&self) -> NaiveTime {
        self.close
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Weekday and not a configured holiday
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// `[open, close]` inclusive on trading days. `testing_mode` forces open.
    pub fn is_market_open(&self, now: DateTime<Tz>, testing_mode: bool) -> bool {
        if testing_mode {
            return true;
        }
        let local = now.with_timezone(&self.tz);
        if !self.is_trading_day(local.date_naive()) {
            return false;
        }
        let time = local.time();
        self.open <= time && time <= self.close
    }

    /// True during the single minute at which the trading day rolls over.
    pub fn is_open_minute(&self, now: DateTime<Tz>) -> bool {
        let local = now.with_timezone(&self.tz);
        local.hour() == self.open.hour() && local.minute() == self.open.minute()
    }

    /// Weekly close window in which the 200-day SMA breach rule applies.
    pub fn is_weekly_close_window(&self, now: DateTime<Tz>) -> bool {
        let local = now.with_timezone(&self.tz);
        local.weekday() == Weekday::Fri && local.hour() >= SMA_BREACH_MIN_HOUR
    }
}
