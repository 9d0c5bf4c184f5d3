//! Candidate universes.
//!
//! A universe is the ordered list of securities the search may propose.
//! Ordering matters because the search truncates to a prefix.

pub mod gics;
pub mod sp500;

pub use gics::GicsSector;
pub use sp500::{Constituent, Sp500Universe};

use wealthspread_data::Ticker;

/// Trait for candidate universes.
pub trait Universe {
    /// All tickers, in candidate order.
    fn tickers(&self) -> Vec<Ticker>;

    /// Check if a ticker is in the universe.
    fn contains(&self, ticker: &str) -> bool {
        self.tickers().iter().any(|t| t.as_str() == ticker)
    }

    /// Get the number of members.
    fn size(&self) -> usize {
        self.tickers().len()
    }
}

impl Universe for Sp500Universe {
    fn tickers(&self) -> Vec<Ticker> {
        Self::tickers(self)
    }

    fn contains(&self, ticker: &str) -> bool {
        self.constituents().iter().any(|c| c.ticker.as_str() == ticker)
    }

    fn size(&self) -> usize {
        self.constituents().len()
    }
}

impl Universe for Vec<Ticker> {
    fn tickers(&self) -> Vec<Ticker> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_trait() {
        let universe = Sp500Universe::fallback();

        assert!(universe.contains("AAPL"));
        assert!(!universe.contains("NOTREAL"));
        assert_eq!(universe.size(), 20);
    }

    #[test]
    fn test_plain_list() {
        let list = vec![Ticker::new("KO").unwrap(), Ticker::new("PEP").unwrap()];
        assert!(Universe::contains(&list, "PEP"));
        assert_eq!(Universe::size(&list), 2);
    }
}
