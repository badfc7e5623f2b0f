//! The long-running bot: market-hours gated checks, the daily summary and the
//! market-open reset, driven by cron jobs.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::calendar::MarketCalendar;
use crate::clock::Clock;
use crate::config::{AppConfig, FeatureConfig, ScheduleConfig};
use crate::constants::schedule::EVERY_MINUTE_CRON;
use crate::error::{BotError, ConfigError, StoreError};
use crate::market::MarketData;
use crate::notify::AlertDispatcher;
use crate::portfolio::PortfolioStore;

use super::reporting::PortfolioSummary;
use super::rules::{RuleEngine, SweepReport};

/// Result of one main tick that found the market open.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckReport {
    pub portfolio: SweepReport,
    pub watchlist: Option<SweepReport>,
}

pub struct AlertBot {
    engine: RuleEngine,
    calendar: MarketCalendar,
    store: PortfolioStore,
    features: FeatureConfig,
    schedule: ScheduleConfig,
    clock: Arc<dyn Clock>,
    last_summary_date: Option<NaiveDate>,
}

impl AlertBot {
    pub fn new(
        config: &AppConfig,
        store: PortfolioStore,
        market: Arc<dyn MarketData>,
        dispatcher: AlertDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let calendar = MarketCalendar::from_config(&config.market)?;
        let engine = RuleEngine::new(market, dispatcher, config.rules.clone(), calendar.clone(), clock.clone());
        Ok(Self {
            engine,
            calendar,
            store,
            features: config.features.clone(),
            schedule: config.schedule.clone(),
            clock,
            last_summary_date: None,
        })
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RuleEngine {
        &mut self.engine
    }

    pub fn store(&self) -> &PortfolioStore {
        &self.store
    }

    pub fn last_summary_date(&self) -> Option<NaiveDate> {
        self.last_summary_date
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.calendar.timezone()).date_naive()
    }

    pub fn is_market_open(&self) -> bool {
        self.calendar.is_market_open(self.clock.now(), self.features.testing_mode)
    }

    /// Main tick. `Ok(None)` when the market is closed.
    pub async fn check_portfolio(&mut self) -> Result<Option<CheckReport>, StoreError> {
        if !self.is_market_open() {
            info!("⏸️ [BOT] Market is closed - {}", self.clock.now().format("%Y-%m-%d %H:%M:%S"));
            return Ok(None);
        }
        self.run_checks().await.map(Some)
    }

    /// One pass that ignores market hours.
    pub async fn run_test_check(&mut self) -> Result<CheckReport, StoreError> {
        info!("🧪 [BOT] Running test check (ignoring market hours)");
        let report = self.run_checks().await?;
        info!("✅ [BOT] Test check complete");
        Ok(report)
    }

    async fn run_checks(&mut self) -> Result<CheckReport, StoreError> {
        // Re-read every tick so edits from the web editor apply without a restart
        let portfolio = self.store.load()?;
        let mut report = CheckReport {
            portfolio: self.engine.evaluate_portfolio(&portfolio.holdings).await,
            watchlist: None,
        };
        if self.features.enable_watchlist_scanning {
            let watchlist = portfolio.unique_watchlist();
            report.watchlist = Some(self.engine.scan_watchlist(&watchlist).await);
        }
        Ok(report)
    }

    /// Trading day, at or after the summary time, not yet sent today.
    pub fn should_send_daily_summary(&self) -> bool {
        let now = self.clock.now().with_timezone(&self.calendar.timezone());
        let today = now.date_naive();
        if !self.calendar.is_trading_day(today) || self.last_summary_date == Some(today) {
            return false;
        }
        match self.schedule.summary_time() {
            Some(at) => now.time() >= at,
            None => false,
        }
    }

    /// Sends the summary when due. Returns whether it went out.
    pub async fn maybe_send_daily_summary(&mut self) -> Result<bool, StoreError> {
        if !self.should_send_daily_summary() {
            return Ok(false);
        }
        info!("📊 [SUMMARY] Generating daily summary");
        let summary = self.summary().await?;
        self.engine.dispatcher().send_daily_summary(&summary.render()).await;
        self.last_summary_date = Some(self.today());
        Ok(true)
    }

    /// Builds a summary of the stored holdings without sending it.
    pub async fn summary(&self) -> Result<PortfolioSummary, StoreError> {
        let portfolio = self.store.load()?;
        Ok(self.engine.generate_daily_summary(&portfolio.holdings).await)
    }

    /// Scans the stored watchlist once, regardless of the feature flag.
    pub async fn scan_once(&mut self) -> Result<SweepReport, StoreError> {
        let watchlist = self.store.load()?.unique_watchlist();
        Ok(self.engine.scan_watchlist(&watchlist).await)
    }

    /// At the exact market-open minute: clear daily alerts and the summary
    /// guard. Returns whether a reset happened.
    pub fn maybe_reset_daily_state(&mut self) -> bool {
        if !self.calendar.is_open_minute(self.clock.now()) {
            return false;
        }
        info!("🔄 [BOT] New trading day - resetting state");
        self.engine.reset_daily_alerts();
        self.last_summary_date = None;
        true
    }

    async fn check_job(&mut self) {
        if let Err(e) = self.check_portfolio().await {
            error!("❌ [BOT] Error during portfolio check: {}", e);
        }
    }

    async fn minute_job(&mut self) {
        self.maybe_reset_daily_state();
        if let Err(e) = self.maybe_send_daily_summary().await {
            error!("❌ [BOT] Error generating daily summary: {}", e);
        }
    }

    fn log_startup(&self) {
        let (holdings, watchlist) = match self.store.load() {
            Ok(p) => (p.holdings.len(), p.unique_watchlist().len()),
            Err(e) => {
                error!("❌ [BOT] Cannot read {}: {}", self.store.path().display(), e);
                (0, 0)
            }
        };
        info!("🤖 [BOT] Portfolio Holdings: {} positions", holdings);
        info!("🤖 [BOT] Watchlist: {} symbols (scanning {})", watchlist, if self.features.enable_watchlist_scanning { "on" } else { "off" });
        info!("🤖 [BOT] Check Interval: every {} minutes", self.schedule.check_interval_minutes);
        info!(
            "🤖 [BOT] Market Hours: {} - {} {}",
            self.calendar.open_time().format("%H:%M"),
            self.calendar.close_time().format("%H:%M"),
            self.calendar.timezone()
        );
        if self.features.testing_mode {
            info!("🧪 [BOT] Testing mode: market hours are ignored");
        }
    }

    /// Runs until Ctrl-C. Every job takes the same lock, so checks, summaries
    /// and resets never overlap.
    pub async fn run(self) -> Result<(), BotError> {
        self.log_startup();
        let interval = Duration::from_secs(self.schedule.check_interval_minutes * 60);
        let summary_at = self
            .schedule
            .summary_time()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default();

        let bot = Arc::new(Mutex::new(self));
        bot.lock().await.check_job().await;

        let mut scheduler = JobScheduler::new().await.map_err(scheduler_error)?;

        let check_bot = bot.clone();
        let check = Job::new_repeated_async(interval, move |_uuid, _l| {
            let bot = check_bot.clone();
            Box::pin(async move {
                bot.lock().await.check_job().await;
            })
        })
        .map_err(scheduler_error)?;
        scheduler.add(check).await.map_err(scheduler_error)?;

        let minute_bot = bot.clone();
        let minute = Job::new_async(EVERY_MINUTE_CRON, move |_uuid, _l| {
            let bot = minute_bot.clone();
            Box::pin(async move {
                bot.lock().await.minute_job().await;
            })
        })
        .map_err(scheduler_error)?;
        scheduler.add(minute).await.map_err(scheduler_error)?;

        scheduler.start().await.map_err(scheduler_error)?;
        info!("🚀 [BOT] Checking every {} minutes during market hours", interval.as_secs() / 60);
        info!("📊 [BOT] Daily summary at {}", summary_at);
        info!("⌨️ [BOT] Press Ctrl+C to stop");

        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ [BOT] Failed to listen for Ctrl+C: {}", e);
        }

        info!("⏹️ [BOT] Stopping scheduler");
        scheduler.shutdown().await.map_err(scheduler_error)?;
        // Let any in-flight job finish before returning
        drop(bot.lock().await);
        info!("⏹️ [BOT] Bot stopped by user");
        Ok(())
    }
}

fn scheduler_error(e: impl std::fmt::Display) -> BotError {
    BotError::Scheduler(e.to_string())
}
