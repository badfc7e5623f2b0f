//! In-memory market data and notification fakes shared by the service tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::calendar::MarketCalendar;
use crate::clock::{Clock, FixedClock};
use crate::config::{MarketConfig, RuleConfig};
use crate::error::DataError;
use crate::market::{DataResult, MarketData, Period, PriceSeries};
use crate::notify::{AlertDispatcher, Notifier, NotifyResult};

use super::rules::RuleEngine;

#[derive(Default)]
pub struct FakeMarket {
    closes: Mutex<HashMap<String, Vec<f64>>>,
    calls: Mutex<Vec<(String, Period)>>,
}

impl FakeMarket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, symbol: &str, closes: Vec<f64>) {
        self.closes.lock().unwrap().insert(symbol.to_string(), closes);
    }

    /// Replaces only the most recent close.
    pub fn set_last(&self, symbol: &str, price: f64) {
        let mut all = self.closes.lock().unwrap();
        let closes = all.entry(symbol.to_string()).or_insert_with(|| vec![price]);
        if let Some(last) = closes.last_mut() {
            *last = price;
        }
    }

    pub fn calls(&self) -> Vec<(String, Period)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, symbol: &str, period: Period) -> DataResult<PriceSeries> {
        self.calls.lock().unwrap().push((symbol.to_string(), period));
        let closes = self.closes.lock().unwrap().get(symbol).cloned();
        match closes {
            Some(c) if !c.is_empty() => {
                let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
                Ok(PriceSeries::from_closes(symbol, start, &c))
            }
            _ => Err(DataError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct Recorder {
    sent: Mutex<Vec<(String, String)>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, b)| b.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    async fn send(&self, subject: &str, body: &str) -> NotifyResult<()> {
        self.sent.lock().unwrap().push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

pub fn clock_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock::at(chrono_tz::America::New_York, y, m, d, h, min).unwrap())
}

pub fn dispatcher(recorder: &Arc<Recorder>, clock: Arc<dyn Clock>) -> AlertDispatcher {
    let channels: Vec<Arc<dyn Notifier>> = vec![recorder.clone()];
    AlertDispatcher::new(channels, clock)
}

pub fn engine(market: &Arc<FakeMarket>, recorder: &Arc<Recorder>, clock: Arc<FixedClock>) -> RuleEngine {
    let calendar = MarketCalendar::from_config(&MarketConfig::default()).unwrap();
    RuleEngine::new(
        market.clone(),
        dispatcher(recorder, clock.clone()),
        RuleConfig::default(),
        calendar,
        clock,
    )
}

/// 30 flat closes at 70, a peak at 100, then an even slide ending at `last`.
/// With `last = 92.0` this is an exact 8% pullback, above the 50-day SMA,
/// with RSI 0.
pub fn pullback_series(last: f64) -> Vec<f64> {
    let mut closes = vec![70.0; 30];
    closes.push(100.0);
    let drop = 100.0 - last;
    closes.extend((1..=39).map(|k| 100.0 - drop * k as f64 / 39.0));
    closes
}
