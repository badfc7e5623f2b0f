use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::info;

use crate::alerts::RuleKind;

/// Identifies one occurrence of a rule firing for a symbol. Date-scoped rules
/// carry the market-local day so the same rule can fire again tomorrow.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub kind: RuleKind,
    pub symbol: String,
    pub date: Option<NaiveDate>,
}

impl AlertKey {
    pub fn unscoped(kind: RuleKind, symbol: impl Into<String>) -> Self {
        Self {
            kind,
            symbol: symbol.into(),
            date: None,
        }
    }

    pub fn dated(kind: RuleKind, symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            kind,
            symbol: symbol.into(),
            date: Some(date),
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{}_{}_{}", self.kind, self.symbol, date),
            None => write!(f, "{}_{}", self.kind, self.symbol),
        }
    }
}

/// Fired-alert table. A present key means the occurrence was already notified.
#[derive(Clone, Debug, Default)]
pub struct AlertState {
    fired: HashMap<AlertKey, DateTime<Utc>>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the key. Returns false when it was already present, in which
    /// case the original timestamp is kept.
    pub fn try_record(&mut self, key: AlertKey, at: DateTime<Utc>) -> bool {
        if self.fired.contains_key(&key) {
            return false;
        }
        self.fired.insert(key, at);
        true
    }

    pub fn contains(&self, key: &AlertKey) -> bool {
        self.fired.contains_key(key)
    }

    pub fn fired_at(&self, key: &AlertKey) -> Option<DateTime<Utc>> {
        self.fired.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AlertKey> {
        self.fired.keys()
    }

    /// Drops date-scoped keys recorded more than 24 hours before `now`.
    /// Unscoped keys live for the whole process. Returns how many were removed.
    pub fn reset_daily(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.fired.len();
        self.fired
            .retain(|key, at| !key.kind.is_date_scoped() || now - *at <= Duration::hours(24));
        let removed = before - self.fired.len();
        if removed > 0 {
            info!("🔄 [ALERTS] Cleared {} daily alert(s), {} still active", removed, self.fired.len());
        }
        removed
    }

    /// Forgets unscoped suppressions for symbols no longer held, so a position
    /// that is removed and re-added alerts again.
    pub fn prune_unheld(&mut self, held: &HashSet<&str>) -> usize {
        let before = self.fired.len();
        self.fired
            .retain(|key, _| key.kind.is_date_scoped() || held.contains(key.symbol.as_str()));
        let removed = before - self.fired.len();
        if removed > 0 {
            info!("🧹 [ALERTS] Dropped {} alert(s) for symbols no longer held", removed);
        }
        removed
    }
}
