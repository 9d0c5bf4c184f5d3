//! Outcome of a batch refresh over a price history.

use crate::ModelError;
use serde::Serialize;
use wealthspread_data::Ticker;

/// A ticker left out of a batch artifact and the reason why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedTicker {
    /// Ticker that was skipped
    pub ticker: Ticker,
    /// Why it was skipped
    #[serde(serialize_with = "serialize_error")]
    pub error: ModelError,
}

fn serialize_error<S: serde::Serializer>(error: &ModelError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Artifact built from every usable ticker, plus the tickers that were not.
///
/// One bad series never aborts a refresh; it is recorded here instead.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    /// The built artifact
    pub artifact: T,
    /// Tickers excluded from the artifact, in ticker order
    pub excluded: Vec<ExcludedTicker>,
}

impl<T> BatchOutcome<T> {
    /// Wrap an artifact with its exclusions.
    pub const fn new(artifact: T, excluded: Vec<ExcludedTicker>) -> Self {
        Self { artifact, excluded }
    }

    /// True when no ticker was excluded.
    pub fn is_complete(&self) -> bool {
        self.excluded.is_empty()
    }
}

pub(crate) fn exclude(ticker: &Ticker, error: ModelError) -> ExcludedTicker {
    tracing::warn!(%ticker, %error, "excluding ticker from refresh");
    ExcludedTicker {
        ticker: ticker.clone(),
        error: error.for_ticker(ticker),
    }
}
