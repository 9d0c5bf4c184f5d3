#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/wealthspread/wealthspread/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod esg;
pub mod prices;
pub mod securities;
pub mod ticker;
pub mod twelvedata;

pub use error::{DataError, Result};
pub use esg::{EsgEntry, EsgRiskLevel, EsgScore, EsgScores};
pub use prices::{PriceHistory, PricePoint, PriceSeries};
pub use securities::{SecurityDirectory, SecurityInfo};
pub use ticker::Ticker;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
