use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    /// Average cost per share
    pub avg_cost: f64,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, shares: f64, avg_cost: f64) -> Self {
        Self {
            symbol: symbol.into(),
            shares,
            avg_cost,
        }
    }

    pub fn cost_basis(&self) -> f64 {
        self.shares * self.avg_cost
    }
}

/// Everything the bot monitors: positions plus symbols scanned for entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
    pub watchlist: Vec<String>,
}

impl Portfolio {
    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol == symbol)
    }

    /// Watchlist with repeats removed, first occurrence wins
    pub fn unique_watchlist(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.watchlist
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect()
    }
}
