//! Scoring and search errors.

use thiserror::Error;
use wealthspread_data::Ticker;

/// Why a single set of weights could not be scored.
///
/// The search treats every variant as "skip this candidate".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// A weighted ticker is missing from the correlation matrix or return map
    #[error("Ticker {ticker} is missing from the {artifact}")]
    MissingTicker {
        /// The missing ticker
        ticker: Ticker,
        /// Which artifact lacks it
        artifact: &'static str,
    },

    /// Weighted correlation is zero, negative or undefined
    #[error("Degenerate weighted correlation: {0}")]
    DegenerateCorrelation(f64),

    /// Expected return or score is not finite
    #[error("Non-finite score: return {expected_return}, correlation {weighted_correlation}")]
    NonFiniteScore {
        /// Weighted expected return
        expected_return: f64,
        /// Weighted correlation
        weighted_correlation: f64,
    },
}

/// Errors returned by [`crate::suggest_addition`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SuggestError {
    /// No candidate produced a valid score
    #[error("No eligible candidate among {evaluated} evaluated")]
    NoEligibleCandidate {
        /// Number of candidates that were tried
        evaluated: usize,
    },

    /// Holdings or investment amount are unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
