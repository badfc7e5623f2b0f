use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::DataConfig;
use crate::constants::http::{REQUEST_TIMEOUT, USER_AGENT};
use crate::error::DataError;

use super::traits::{DataResult, MarketData};
use super::types::{Period, PricePoint, PriceSeries};

/// Daily and intraday closes from the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize, Debug)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize, Debug)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: String,
    description: Option<String>,
}

impl YahooClient {
    pub fn new(config: &DataConfig) -> DataResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketData for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, symbol: &str, period: Period) -> DataResult<PriceSeries> {
        let url = format!("{}/{}", self.base_url, symbol);
        let resp = self
            .client
            .get(&url)
            .query(&[("range", period.range()), ("interval", period.interval())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Http {
                symbol: symbol.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let series = parse_chart(symbol, &body)?;
        debug!("[YAHOO] {} {}: {} closes", symbol, period.range(), series.len());
        Ok(series)
    }
}

/// Turns a chart payload into a series, dropping bars without a close.
pub fn parse_chart(symbol: &str, body: &str) -> DataResult<PriceSeries> {
    let parsed: ChartResponse = serde_json::from_str(body).map_err(|e| DataError::Parse {
        symbol: symbol.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(err) = parsed.chart.error {
        debug!(
            "[YAHOO] {} error {}: {}",
            symbol,
            err.code,
            err.description.unwrap_or_default()
        );
        return Err(DataError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let result = parsed
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::NoData {
            symbol: symbol.to_string(),
        })?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let points: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let close = close.filter(|c| c.is_finite())?;
            let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
            Some(PricePoint { date, close })
        })
        .collect();

    if points.is_empty() {
        return Err(DataError::NoData {
            symbol: symbol.to_string(),
        });
    }

    Ok(PriceSeries::new(symbol, points))
}
