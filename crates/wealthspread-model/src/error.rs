//! Errors raised while building the correlation and return models.

use thiserror::Error;
use wealthspread_data::Ticker;

/// Errors that can occur during model construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Too few observations to derive a return
    #[error("Insufficient data{}: need at least {required} observations, got {actual}", for_ticker(.ticker))]
    InsufficientData {
        /// Ticker whose series was too short, when known
        ticker: Option<Ticker>,
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// A price was zero, negative or not a number
    #[error("Invalid price{}: {price}", for_ticker(.ticker))]
    InvalidPrice {
        /// Ticker whose series held the price, when known
        ticker: Option<Ticker>,
        /// Offending price
        price: f64,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Matrix is not symmetric
    #[error("Correlation matrix is not symmetric at ({row}, {col})")]
    NotSymmetric {
        /// Row ticker
        row: Ticker,
        /// Column ticker
        col: Ticker,
    },
}

impl ModelError {
    /// Attach the ticker a per-series error belongs to.
    pub fn for_ticker(self, ticker: &Ticker) -> Self {
        match self {
            Self::InsufficientData {
                required, actual, ..
            } => Self::InsufficientData {
                ticker: Some(ticker.clone()),
                required,
                actual,
            },
            Self::InvalidPrice { price, .. } => Self::InvalidPrice {
                ticker: Some(ticker.clone()),
                price,
            },
            other => other,
        }
    }
}

fn for_ticker(ticker: &Option<Ticker>) -> String {
    ticker
        .as_ref()
        .map(|t| format!(" for {}", t))
        .unwrap_or_default()
}
