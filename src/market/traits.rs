use async_trait::async_trait;

use crate::error::DataError;

use super::types::{Period, PriceSeries};

pub type DataResult<T> = Result<T, DataError>;

#[async_trait]
pub trait MarketData: Send + Sync {
    fn name(&self) -> &'static str;

    /// Closing prices for `symbol` over `period`. An empty response is
    /// reported as `DataError::NoData`, so an `Ok` series always has a last close.
    async fn fetch(&self, symbol: &str, period: Period) -> DataResult<PriceSeries>;
}
