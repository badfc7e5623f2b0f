pub mod alert_state;
pub mod reporting;
pub mod rules;
pub mod scheduler;

pub use alert_state::{AlertKey, AlertState};
pub use reporting::{PortfolioSummary, PositionLine};
pub use rules::{RuleEngine, SweepReport};
pub use scheduler::{AlertBot, CheckReport};

#[cfg(test)]
mod reporting_tests;
#[cfg(test)]
mod rules_tests;
#[cfg(test)]
pub(crate) mod test_support;
