//! Portfolio Alerts - stock portfolio monitoring and alerting
//!
//! This library watches a small set of holdings during market hours, applies
//! stop-loss, profit-target and trend rules, and notifies through Telegram and
//! email. A watchlist can be scanned for momentum pullbacks.

pub mod alerts;
pub mod api;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod indicators;
pub mod market;
pub mod notify;
pub mod portfolio;
pub mod services;

// Re-export commonly used types
pub use alerts::{Alert, RuleKind};
pub use calendar::MarketCalendar;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use portfolio::{Holding, Portfolio, PortfolioStore};
pub use services::{AlertBot, AlertState, PortfolioSummary, RuleEngine};
