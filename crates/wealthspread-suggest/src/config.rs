//! Candidate search configuration.

use serde::{Deserialize, Serialize};

/// Candidate search configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestConfig {
    /// Candidates evaluated when holdings have at most one entry (default: 30)
    pub small_portfolio_limit: Option<usize>,

    /// Candidates evaluated otherwise (default: 50)
    pub candidate_limit: Option<usize>,

    /// Ranked candidates reported as alternatives, best included (default: 3)
    pub alternatives: usize,

    /// Score candidates on the rayon pool (default: true)
    pub parallel: bool,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            small_portfolio_limit: Some(30),
            candidate_limit: Some(50),
            alternatives: 3,
            parallel: true,
        }
    }
}

impl SuggestConfig {
    /// Evaluate every eligible candidate.
    pub fn exhaustive() -> Self {
        Self {
            small_portfolio_limit: None,
            candidate_limit: None,
            ..Self::default()
        }
    }

    /// Candidate prefix length for a portfolio of `holdings` entries;
    /// `None` means no truncation.
    pub const fn limit_for(&self, holdings: usize) -> Option<usize> {
        if holdings <= 1 {
            self.small_portfolio_limit
        } else {
            self.candidate_limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Some(30))]
    #[case(1, Some(30))]
    #[case(2, Some(50))]
    #[case(12, Some(50))]
    fn test_limit_for(#[case] holdings: usize, #[case] expected: Option<usize>) {
        assert_eq!(SuggestConfig::default().limit_for(holdings), expected);
    }

    #[test]
    fn test_exhaustive() {
        let config = SuggestConfig::exhaustive();
        assert_eq!(config.limit_for(1), None);
        assert_eq!(config.limit_for(5), None);
        assert_eq!(config.alternatives, 3);
    }
}
