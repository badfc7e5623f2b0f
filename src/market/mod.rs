pub mod traits;
pub mod types;

pub mod yahoo;

pub use traits::{DataResult, MarketData};
pub use types::{Period, PricePoint, PriceSeries};
