use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::error::StoreError;

use super::types::{Holding, Portfolio};

/// YAML-backed holdings and watchlist.
///
/// Every mutation is a full read-modify-write under one lock, so concurrent
/// edits from the web editor never interleave.
#[derive(Clone, Debug)]
pub struct PortfolioStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl PortfolioStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty portfolio.
    pub fn load(&self) -> Result<Portfolio, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("⚠️ [STORE] {} not found - starting with an empty portfolio", self.path.display());
                return Ok(Portfolio::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        if content.trim().is_empty() {
            return Ok(Portfolio::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Writes to a sibling temp file first so a crash never leaves a torn file.
    pub fn save(&self, portfolio: &Portfolio) -> Result<(), StoreError> {
        let yaml = serde_yaml::to_string(portfolio)?;
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn update<T>(&self, f: impl FnOnce(&mut Portfolio) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut portfolio = self.load()?;
        let out = f(&mut portfolio)?;
        self.save(&portfolio)?;
        Ok(out)
    }

    pub fn add_holding(&self, symbol: &str, shares: f64, avg_cost: f64) -> Result<Holding, StoreError> {
        let symbol = normalize_symbol(symbol)?;
        if !(shares.is_finite() && shares > 0.0 && avg_cost.is_finite() && avg_cost > 0.0) {
            return Err(StoreError::InvalidHolding { symbol });
        }

        let holding = self.update(|p| {
            if p.holding(&symbol).is_some() {
                return Err(StoreError::Duplicate {
                    symbol: symbol.clone(),
                    list: "holdings",
                });
            }
            let holding = Holding::new(symbol.clone(), shares, avg_cost);
            p.holdings.push(holding.clone());
            Ok(holding)
        })?;

        info!("💼 [STORE] Added holding {} ({} @ ${:.2})", holding.symbol, holding.shares, holding.avg_cost);
        Ok(holding)
    }

    /// Returns whether anything was removed.
    pub fn remove_holding(&self, symbol: &str) -> Result<bool, StoreError> {
        let symbol = symbol.trim().to_uppercase();
        let removed = self.update(|p| {
            let before = p.holdings.len();
            p.holdings.retain(|h| h.symbol != symbol);
            Ok(p.holdings.len() != before)
        })?;
        if removed {
            info!("💼 [STORE] Removed holding {}", symbol);
        }
        Ok(removed)
    }

    pub fn add_watch(&self, symbol: &str) -> Result<String, StoreError> {
        let symbol = normalize_symbol(symbol)?;
        self.update(|p| {
            if p.watchlist.contains(&symbol) {
                return Err(StoreError::Duplicate {
                    symbol: symbol.clone(),
                    list: "watchlist",
                });
            }
            p.watchlist.push(symbol.clone());
            Ok(())
        })?;
        info!("👀 [STORE] Added {} to watchlist", symbol);
        Ok(symbol)
    }

    pub fn remove_watch(&self, symbol: &str) -> Result<bool, StoreError> {
        let symbol = symbol.trim().to_uppercase();
        let removed = self.update(|p| {
            let before = p.watchlist.len();
            p.watchlist.retain(|s| *s != symbol);
            Ok(p.watchlist.len() != before)
        })?;
        if removed {
            info!("👀 [STORE] Removed {} from watchlist", symbol);
        }
        Ok(removed)
    }
}

/// Upper-cases and trims a ticker; accepts letters, digits and `.-^=`.
pub fn normalize_symbol(raw: &str) -> Result<String, StoreError> {
    let symbol = raw.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= 12
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if valid {
        Ok(symbol)
    } else {
        Err(StoreError::InvalidSymbol {
            symbol: raw.to_string(),
        })
    }
}
