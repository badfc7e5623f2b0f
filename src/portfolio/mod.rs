pub mod store;
pub mod types;

pub use store::PortfolioStore;
pub use types::{Holding, Portfolio};
