//! Result of a candidate search.

use crate::esg_blend::EsgBlend;
use crate::portfolio::Holdings;
use crate::scorer::PortfolioScore;
use serde::{Deserialize, Serialize};
use wealthspread_data::Ticker;

/// A candidate together with the score of the portfolio that includes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Candidate ticker
    pub ticker: Ticker,
    /// Sharpe-like score of the portfolio with the candidate added
    pub score: f64,
    /// Weighted correlation of that portfolio
    pub weighted_correlation: f64,
    /// Expected return of that portfolio
    pub expected_return: f64,
}

impl ScoredCandidate {
    pub(crate) fn new(ticker: Ticker, score: PortfolioScore) -> Self {
        Self {
            ticker,
            score: score.score,
            weighted_correlation: score.weighted_correlation,
            expected_return: score.expected_return,
        }
    }
}

/// Best addition to a portfolio, with ranked alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Holdings the search started from
    pub holdings: Holdings,
    /// New money to invest
    pub investment_amount: f64,
    /// Highest ranked candidate
    pub best: ScoredCandidate,
    /// Top ranked candidates, `best` first
    pub alternatives: Vec<ScoredCandidate>,
    /// ESG risk before and after adding `best`
    pub esg: EsgBlend,
    /// Candidates tried
    pub evaluated: usize,
    /// Candidates that produced a score
    pub scored: usize,
}
