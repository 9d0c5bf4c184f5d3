//! Portfolio ESG risk before and after an addition.
//!
//! The portfolio score is the holdings-weighted mean of each ticker's total
//! ESG risk. A ticker without ESG data counts as zero, which understates
//! risk, so every such ticker is listed in `missing`.

use crate::portfolio::{Holdings, normalize, with_addition};
use serde::{Deserialize, Serialize};
use wealthspread_data::{EsgScores, Ticker};

/// Weighted ESG score of a set of holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEsg {
    /// Weighted total ESG risk
    pub score: f64,
    /// Tickers that had no ESG data and counted as zero
    pub missing: Vec<Ticker>,
}

/// Weighted ESG score of `holdings`.
pub fn weighted_esg(holdings: &Holdings, esg: &EsgScores) -> WeightedEsg {
    let mut score = 0.0;
    let mut missing = Vec::new();

    for (ticker, weight) in normalize(holdings) {
        match esg.total(ticker.as_str()) {
            Some(total) => score += weight * total,
            None => missing.push(ticker),
        }
    }

    WeightedEsg { score, missing }
}

/// ESG scores around a suggested addition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgBlend {
    /// Score of the current holdings
    pub before: f64,
    /// Score after the addition
    pub after: f64,
    /// `after - before`
    pub delta: f64,
    /// Tickers of the new portfolio without ESG data
    pub missing: Vec<Ticker>,
}

impl EsgBlend {
    /// Blend for investing `amount` in `addition` on top of `holdings`.
    pub fn compute(holdings: &Holdings, addition: &Ticker, amount: f64, esg: &EsgScores) -> Self {
        let before = weighted_esg(holdings, esg);
        let after = weighted_esg(&with_addition(holdings, addition, amount), esg);

        Self {
            before: before.score,
            after: after.score,
            delta: after.score - before.score,
            missing: after.missing,
        }
    }

    /// Whether some constituent lacked ESG data.
    pub fn is_biased(&self) -> bool {
        !self.missing.is_empty()
    }
}
