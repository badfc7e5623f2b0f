//! Alert events raised by the rule engine and their human-readable form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule that produced an alert. Also the first component of an alert key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    HardStop,
    Warning,
    ProfitTarget,
    SmaBreach,
    Recommendation,
}

impl RuleKind {
    /// Date-scoped rules may fire again on a later day; the rest fire once per process.
    pub fn is_date_scoped(&self) -> bool {
        matches!(self, RuleKind::SmaBreach | RuleKind::Recommendation)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleKind::HardStop => "hard_stop",
            RuleKind::Warning => "warning",
            RuleKind::ProfitTarget => "profit_target",
            RuleKind::SmaBreach => "sma_breach",
            RuleKind::Recommendation => "recommendation",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Alert {
    HardStop {
        symbol: String,
        price: f64,
        avg_cost: f64,
        loss_pct: f64,
    },
    Warning {
        symbol: String,
        price: f64,
        avg_cost: f64,
        loss_pct: f64,
        /// Price at which the hard stop would trigger
        stop_price: f64,
    },
    ProfitTarget {
        symbol: String,
        price: f64,
        avg_cost: f64,
        gain_pct: f64,
    },
    SmaBreach {
        symbol: String,
        close: f64,
        sma_200: f64,
    },
    BuySignal {
        symbol: String,
        price: f64,
        sma_50: f64,
        high_52w: f64,
        pullback_pct: f64,
        rsi: f64,
    },
}

impl Alert {
    pub fn kind(&self) -> RuleKind {
        match self {
            Alert::HardStop { .. } => RuleKind::HardStop,
            Alert::Warning { .. } => RuleKind::Warning,
            Alert::ProfitTarget { .. } => RuleKind::ProfitTarget,
            Alert::SmaBreach { .. } => RuleKind::SmaBreach,
            Alert::BuySignal { .. } => RuleKind::Recommendation,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Alert::HardStop { symbol, .. }
            | Alert::Warning { symbol, .. }
            | Alert::ProfitTarget { symbol, .. }
            | Alert::SmaBreach { symbol, .. }
            | Alert::BuySignal { symbol, .. } => symbol,
        }
    }

    /// Email subject line
    pub fn subject(&self) -> String {
        match self {
            Alert::HardStop { symbol, .. } => format!("🔴 HARD STOP: {} - SELL NOW", symbol),
            Alert::Warning { symbol, .. } => format!("⚠️ WARNING: {} Approaching Stop", symbol),
            Alert::ProfitTarget { symbol, gain_pct, .. } => {
                format!("🎯 PROFIT: {} +{:.0}% Target Hit", symbol, gain_pct)
            }
            Alert::SmaBreach { symbol, .. } => format!("📉 {} - 200-Day MA Breach", symbol),
            Alert::BuySignal { symbol, .. } => format!("💡 BUY SIGNAL: {}", symbol),
        }
    }

    /// Message body, plain text
    pub fn body(&self) -> String {
        match self {
            Alert::HardStop {
                symbol,
                price,
                avg_cost,
                loss_pct,
            } => format!(
                "🔴 HARD STOP TRIGGERED - SELL NOW! 🔴\n\n\
                 Symbol: {}\n\
                 Current Price: ${:.2}\n\
                 Your Avg Cost: ${:.2}\n\
                 Loss: {:.1}%\n\n\
                 ⚠️ ACTION REQUIRED: Sell 100% of position immediately!",
                symbol, price, avg_cost, loss_pct
            ),
            Alert::Warning {
                symbol,
                price,
                avg_cost,
                loss_pct,
                stop_price,
            } => format!(
                "⚠️ EARLY WARNING - Approaching Stop Loss\n\n\
                 Symbol: {}\n\
                 Current Price: ${:.2}\n\
                 Your Avg Cost: ${:.2}\n\
                 Loss: {:.1}%\n\n\
                 📊 Prepare to sell if it drops further to ${:.2}",
                symbol, price, avg_cost, loss_pct, stop_price
            ),
            Alert::ProfitTarget {
                symbol,
                price,
                avg_cost,
                gain_pct,
            } => format!(
                "🎯 PROFIT TARGET HIT - Consider Taking Gains! 🎯\n\n\
                 Symbol: {}\n\
                 Current Price: ${:.2}\n\
                 Your Avg Cost: ${:.2}\n\
                 Gain: +{:.1}%\n\n\
                 💰 Consider selling 60-75% to lock in profits",
                symbol, price, avg_cost, gain_pct
            ),
            Alert::SmaBreach { symbol, close, sma_200 } => format!(
                "📉 200-DAY SMA BREACH DETECTED\n\n\
                 Symbol: {}\n\
                 Closing Price: ${:.2}\n\
                 200-Day SMA: ${:.2}\n\n\
                 ⚠️ PLAN TO SELL: Consider selling on Monday morning",
                symbol, close, sma_200
            ),
            Alert::BuySignal {
                symbol,
                price,
                sma_50,
                high_52w,
                pullback_pct,
                rsi,
            } => format!(
                "💡 BUY OPPORTUNITY DETECTED\n\n\
                 Symbol: {}\n\
                 Current Price: ${:.2}\n\
                 50-Day SMA: ${:.2}\n\
                 52-Week High: ${:.2}\n\
                 Pullback: {:.1}% from high\n\
                 RSI(14): {:.1}\n\n\
                 ✅ Momentum + Pullback criteria met\n\
                 📈 Consider buying - price above 50-day MA with healthy pullback",
                symbol, price, sma_50, high_52w, pullback_pct, rsi
            ),
        }
    }
}
