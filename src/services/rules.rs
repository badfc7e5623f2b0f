//! Threshold rules over held positions and the watchlist.
//!
//! The engine owns the fired-alert table. Every rule claims its alert key
//! before sending, so a notification goes out at most once per occurrence.

use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::alerts::{Alert, RuleKind};
use crate::calendar::MarketCalendar;
use crate::clock::Clock;
use crate::config::RuleConfig;
use crate::constants::indicators::{RSI_PERIOD, SMA_LONG_WINDOW, SMA_SHORT_WINDOW};
use crate::indicators::{pct_change, rsi, sma};
use crate::market::{DataResult, MarketData, Period};
use crate::notify::AlertDispatcher;
use crate::portfolio::Holding;

use super::alert_state::{AlertKey, AlertState};
use super::reporting::{PortfolioSummary, PositionLine};

/// `price <= avg_cost * hard_stop`
pub fn hard_stop_triggered(price: f64, avg_cost: f64, hard_stop: f64) -> bool {
    price <= avg_cost * hard_stop
}

/// Between the hard stop (exclusive) and the warning level (inclusive).
pub fn warning_triggered(price: f64, avg_cost: f64, hard_stop: f64, warning: f64) -> bool {
    avg_cost * hard_stop < price && price <= avg_cost * warning
}

/// `price >= avg_cost * target`
pub fn profit_target_triggered(price: f64, avg_cost: f64, target: f64) -> bool {
    price >= avg_cost * target
}

/// What one sweep looked at and what it sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepReport {
    pub evaluated: usize,
    pub skipped: Vec<String>,
    pub alerts: Vec<Alert>,
}

impl SweepReport {
    pub fn fired(&self, kind: RuleKind, symbol: &str) -> bool {
        self.alerts.iter().any(|a| a.kind() == kind && a.symbol() == symbol)
    }
}

pub struct RuleEngine {
    market: Arc<dyn MarketData>,
    dispatcher: AlertDispatcher,
    rules: RuleConfig,
    calendar: MarketCalendar,
    clock: Arc<dyn Clock>,
    state: AlertState,
}

impl RuleEngine {
    pub fn new(
        market: Arc<dyn MarketData>,
        dispatcher: AlertDispatcher,
        rules: RuleConfig,
        calendar: MarketCalendar,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            market,
            dispatcher,
            rules,
            calendar,
            clock,
            state: AlertState::new(),
        }
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.calendar.timezone()).date_naive()
    }

    /// Claims `key` and sends `alert`. `None` when the key was already held.
    async fn fire(&mut self, key: AlertKey, alert: Alert) -> Option<Alert> {
        let now = self.clock.now().with_timezone(&Utc);
        if !self.state.try_record(key.clone(), now) {
            debug!("[RULES] {} already notified - suppressed", key);
            return None;
        }
        self.dispatcher.send_alert(&alert).await;
        Some(alert)
    }

    pub async fn check_hard_stop(&mut self, symbol: &str, price: f64, avg_cost: f64) -> Option<Alert> {
        if !hard_stop_triggered(price, avg_cost, self.rules.hard_stop_multiplier) {
            return None;
        }
        let alert = Alert::HardStop {
            symbol: symbol.to_string(),
            price,
            avg_cost,
            loss_pct: -pct_change(avg_cost, price),
        };
        self.fire(AlertKey::unscoped(RuleKind::HardStop, symbol), alert).await
    }

    pub async fn check_warning(&mut self, symbol: &str, price: f64, avg_cost: f64) -> Option<Alert> {
        let hard_stop = self.rules.hard_stop_multiplier;
        if !warning_triggered(price, avg_cost, hard_stop, self.rules.warning_multiplier) {
            return None;
        }
        let alert = Alert::Warning {
            symbol: symbol.to_string(),
            price,
            avg_cost,
            loss_pct: -pct_change(avg_cost, price),
            stop_price: avg_cost * hard_stop,
        };
        self.fire(AlertKey::unscoped(RuleKind::Warning, symbol), alert).await
    }

    pub async fn check_profit_target(&mut self, symbol: &str, price: f64, avg_cost: f64) -> Option<Alert> {
        if !profit_target_triggered(price, avg_cost, self.rules.profit_target_multiplier) {
            return None;
        }
        let alert = Alert::ProfitTarget {
            symbol: symbol.to_string(),
            price,
            avg_cost,
            gain_pct: pct_change(avg_cost, price),
        };
        self.fire(AlertKey::unscoped(RuleKind::ProfitTarget, symbol), alert).await
    }

    /// Weekly check after the Friday close: last close below the 200-day SMA.
    pub async fn check_sma_200_breach(&mut self, symbol: &str) -> DataResult<Option<Alert>> {
        if !self.calendar.is_weekly_close_window(self.clock.now()) {
            return Ok(None);
        }
        let key = AlertKey::dated(RuleKind::SmaBreach, symbol, self.today());
        if self.state.contains(&key) {
            return Ok(None);
        }

        let series = self.market.fetch(symbol, Period::OneYear).await?;
        let closes = series.closes();
        let sma_200 = match sma(&closes, SMA_LONG_WINDOW) {
            Ok(v) => v,
            Err(e) => {
                info!("⚠️ [RULES] {}: no 200-day SMA ({})", symbol, e);
                return Ok(None);
            }
        };
        let Some(close) = series.last_close() else {
            return Ok(None);
        };

        if close >= sma_200 {
            return Ok(None);
        }
        let alert = Alert::SmaBreach {
            symbol: symbol.to_string(),
            close,
            sma_200,
        };
        Ok(self.fire(key, alert).await)
    }

    /// Buy signal: uptrend above the 50-day SMA, a deep enough pullback from
    /// the 52-week high, and RSI not overbought.
    pub async fn check_momentum_pullback(&mut self, symbol: &str) -> DataResult<Option<Alert>> {
        let key = AlertKey::dated(RuleKind::Recommendation, symbol, self.today());
        if self.state.contains(&key) {
            return Ok(None);
        }

        let series = self.market.fetch(symbol, Period::OneYear).await?;
        let (Some(price), Some(high_52w)) = (series.last_close(), series.high()) else {
            return Ok(None);
        };

        if price < self.rules.recommendation_min_price {
            debug!("[RULES] {}: ${:.2} below minimum price", symbol, price);
            return Ok(None);
        }

        let closes = series.closes();
        let sma_50 = match sma(&closes, SMA_SHORT_WINDOW) {
            Ok(v) => v,
            Err(e) => {
                info!("⚠️ [RULES] {}: no 50-day SMA ({})", symbol, e);
                return Ok(None);
            }
        };
        if price <= sma_50 {
            return Ok(None);
        }

        let pullback_pct = (high_52w - price) * 100.0 / high_52w;
        if pullback_pct < self.rules.recommendation_pullback_percent {
            return Ok(None);
        }

        let rsi = rsi(&closes, RSI_PERIOD);
        if rsi >= self.rules.recommendation_rsi_max {
            return Ok(None);
        }

        let alert = Alert::BuySignal {
            symbol: symbol.to_string(),
            price,
            sma_50,
            high_52w,
            pullback_pct,
            rsi,
        };
        Ok(self.fire(key, alert).await)
    }

    /// Runs the position rules over every holding. Symbols whose data cannot
    /// be fetched are skipped; the sweep always completes.
    pub async fn evaluate_portfolio(&mut self, holdings: &[Holding]) -> SweepReport {
        info!(
            "🔍 [RULES] Checking portfolio - {} ({} holdings)",
            self.clock.now().format("%Y-%m-%d %H:%M:%S"),
            holdings.len()
        );

        let held: HashSet<&str> = holdings.iter().map(|h| h.symbol.as_str()).collect();
        self.state.prune_unheld(&held);

        let mut report = SweepReport::default();
        for holding in holdings {
            let symbol = holding.symbol.as_str();
            let price = match self.market.fetch(symbol, Period::ThreeMonths).await {
                Ok(series) => series.last_close(),
                Err(e) => {
                    warn!("⚠️ [RULES] Skipping {}: {}", symbol, e);
                    None
                }
            };
            let Some(price) = price else {
                report.skipped.push(symbol.to_string());
                continue;
            };

            report.evaluated += 1;
            let pnl_pct = pct_change(holding.avg_cost, price);
            info!(
                "📈 [RULES] {} | Current: ${:.2} | Avg Cost: ${:.2} | P&L: {}{:.1}%",
                symbol,
                price,
                holding.avg_cost,
                if pnl_pct >= 0.0 { "+" } else { "" },
                pnl_pct
            );

            let avg_cost = holding.avg_cost;
            let fired = [
                self.check_hard_stop(symbol, price, avg_cost).await,
                self.check_warning(symbol, price, avg_cost).await,
                self.check_profit_target(symbol, price, avg_cost).await,
            ];
            report.alerts.extend(fired.into_iter().flatten());

            match self.check_sma_200_breach(symbol).await {
                Ok(alert) => report.alerts.extend(alert),
                Err(e) => warn!("⚠️ [RULES] {}: SMA check failed: {}", symbol, e),
            }
        }

        info!(
            "✅ [RULES] Portfolio check complete: {} evaluated, {} skipped, {} alert(s)",
            report.evaluated,
            report.skipped.len(),
            report.alerts.len()
        );
        report
    }

    /// Looks for buy signals across the watchlist.
    pub async fn scan_watchlist(&mut self, symbols: &[String]) -> SweepReport {
        info!("🔎 [SCAN] Scanning {} watchlist symbol(s) for buy signals", symbols.len());

        let mut report = SweepReport::default();
        for symbol in symbols {
            match self.check_momentum_pullback(symbol).await {
                Ok(alert) => {
                    report.evaluated += 1;
                    report.alerts.extend(alert);
                }
                Err(e) => {
                    warn!("⚠️ [SCAN] Error analyzing {}: {}", symbol, e);
                    report.skipped.push(symbol.clone());
                }
            }
        }

        if report.alerts.is_empty() {
            info!("🔎 [SCAN] No buy opportunities found at this time");
        } else {
            info!("✅ [SCAN] Found {} buy recommendation(s)", report.alerts.len());
        }
        report
    }

    pub async fn generate_daily_summary(&self, holdings: &[Holding]) -> PortfolioSummary {
        let mut summary = PortfolioSummary::new(self.clock.now());

        for holding in holdings {
            match self.market.fetch(&holding.symbol, Period::FiveDays).await {
                Ok(series) => match series.last_close() {
                    Some(price) => summary.positions.push(PositionLine::new(
                        holding,
                        price,
                        self.rules.hard_stop_multiplier,
                    )),
                    None => summary.unavailable.push(holding.symbol.clone()),
                },
                Err(e) => {
                    warn!("⚠️ [SUMMARY] No price for {}: {}", holding.symbol, e);
                    summary.unavailable.push(holding.symbol.clone());
                }
            }
        }
        summary
    }

    /// Clears date-scoped alerts older than a day. Position alerts stay.
    pub fn reset_daily_alerts(&mut self) -> usize {
        let now = self.clock.now().with_timezone(&Utc);
        self.state.reset_daily(now)
    }
}
