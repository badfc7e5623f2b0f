use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lookback requested from the data provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Today's one-minute bars, for a fresh quote
    Intraday,
    FiveDays,
    ThreeMonths,
    OneYear,
}

impl Period {
    pub fn range(&self) -> &'static str {
        match self {
            Period::Intraday => "1d",
            Period::FiveDays => "5d",
            Period::ThreeMonths => "3mo",
            Period::OneYear => "1y",
        }
    }

    pub fn interval(&self) -> &'static str {
        match self {
            Period::Intraday => "1m",
            _ => "1d",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices for one symbol, ascending by date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        // Stable sort keeps intraday bars of the same date in arrival order
        points.sort_by_key(|p| p.date);
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    /// Consecutive daily closes starting at `start`, one calendar day apart.
    pub fn from_closes(symbol: impl Into<String>, start: NaiveDate, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .zip(start.iter_days())
            .map(|(close, date)| PricePoint { date, close: *close })
            .collect();
        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    /// Highest close in the series
    pub fn high(&self) -> Option<f64> {
        self.points.iter().map(|p| p.close).reduce(f64::max)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
