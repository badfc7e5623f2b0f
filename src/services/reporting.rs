use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::indicators::pct_change;
use crate::portfolio::Holding;

const RULE: &str = "==================================================";

/// One priced position in the daily summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionLine {
    pub symbol: String,
    pub shares: f64,
    pub avg_cost: f64,
    pub price: f64,
    pub value: f64,
    pub cost_basis: f64,
    pub pnl: f64,
    pub pnl_pct: f64,

    /// How far price can fall, as a percentage of price, before the hard stop
    pub to_stop_pct: f64,
}

impl PositionLine {
    pub fn new(holding: &Holding, price: f64, hard_stop_multiplier: f64) -> Self {
        let value = holding.shares * price;
        let cost_basis = holding.cost_basis();
        let stop_price = holding.avg_cost * hard_stop_multiplier;
        Self {
            symbol: holding.symbol.clone(),
            shares: holding.shares,
            avg_cost: holding.avg_cost,
            price,
            value,
            cost_basis,
            pnl: value - cost_basis,
            pnl_pct: pct_change(holding.avg_cost, price),
            to_stop_pct: (price - stop_price) * 100.0 / price,
        }
    }
}

/// Daily portfolio summary. Totals cover only the positions that priced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub generated_at: DateTime<Tz>,
    pub positions: Vec<PositionLine>,
    pub unavailable: Vec<String>,
}

impl PortfolioSummary {
    pub fn new(generated_at: DateTime<Tz>) -> Self {
        Self {
            generated_at,
            positions: Vec::new(),
            unavailable: Vec::new(),
        }
    }

    pub fn total_value(&self) -> f64 {
        self.positions.iter().map(|p| p.value).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.positions.iter().map(|p| p.cost_basis).sum()
    }

    pub fn total_pnl(&self) -> f64 {
        self.total_value() - self.total_cost()
    }

    /// Zero when nothing priced
    pub fn total_pnl_pct(&self) -> f64 {
        let cost = self.total_cost();
        if cost > 0.0 {
            self.total_pnl() * 100.0 / cost
        } else {
            0.0
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            RULE.to_string(),
            "📊 PORTFOLIO SUMMARY".to_string(),
            format!("Date: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            RULE.to_string(),
            String::new(),
        ];

        for p in &self.positions {
            lines.push(format!(
                "{:<6} | Price: ${:7.2} | Value: ${:8.2} | P&L: {}{:6.1}% | To Stop: {:.1}%",
                p.symbol,
                p.price,
                p.value,
                if p.pnl >= 0.0 { "+" } else { "" },
                p.pnl_pct,
                p.to_stop_pct
            ));
        }

        if !self.unavailable.is_empty() {
            lines.push(String::new());
            lines.push(format!("⚠️ No price data: {}", self.unavailable.join(", ")));
        }

        let pnl = self.total_pnl();
        let pnl_pct = self.total_pnl_pct();
        lines.push(String::new());
        lines.push(RULE.to_string());
        lines.push(format!("TOTAL VALUE:  ${}", money(self.total_value())));
        lines.push(format!("TOTAL COST:   ${}", money(self.total_cost())));
        lines.push(format!(
            "TOTAL P&L:    {}${} ({}{:.2}%)",
            if pnl >= 0.0 { "+" } else { "-" },
            money(pnl.abs()),
            if pnl_pct >= 0.0 { "+" } else { "" },
            pnl_pct
        ));
        lines.push(RULE.to_string());

        lines.join("\n")
    }
}

/// Two decimals with thousands separators, e.g. `12,345.60`.
pub fn money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
