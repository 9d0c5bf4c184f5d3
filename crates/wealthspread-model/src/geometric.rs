//! Capped annualised geometric returns.
//!
//! The return of a ticker is the compounded growth between the first and
//! last close of its window:
//!
//! R = (P_end / P_start)^(1 / years) - 1
//!
//! Short or volatile windows can compound to implausible rates, so every
//! value is capped before it enters the [`ReturnMap`].

use crate::ModelError;
use crate::batch::{BatchOutcome, exclude};
use crate::returns::is_valid_price;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use wealthspread_data::{PriceHistory, PriceSeries, Ticker};

/// Return model configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnModelConfig {
    /// Length of the price window in years (default: 5.0)
    pub years: f64,

    /// Ceiling applied to every annualised return (default: 0.45)
    pub cap: f64,
}

impl Default for ReturnModelConfig {
    fn default() -> Self {
        Self {
            years: 5.0,
            cap: 0.45,
        }
    }
}

impl ReturnModelConfig {
    /// Check the parameters.
    ///
    /// # Errors
    /// [`ModelError::InvalidParameter`] for a non-positive or non-finite
    /// `years`, or a non-finite `cap`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.years.is_finite() || self.years <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "years must be positive and finite, got {}",
                self.years
            )));
        }
        if !self.cap.is_finite() {
            return Err(ModelError::InvalidParameter(format!(
                "cap must be finite, got {}",
                self.cap
            )));
        }
        Ok(())
    }
}

/// Geometric return estimator
#[derive(Debug, Clone)]
pub struct GeometricReturnEstimator {
    config: ReturnModelConfig,
}

impl GeometricReturnEstimator {
    /// Create an estimator, validating the configuration.
    pub fn new(config: ReturnModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create with default configuration.
    ///
    /// # Errors
    /// Returns an error if the default configuration is invalid (should not happen).
    pub fn try_default() -> Result<Self, ModelError> {
        Self::new(ReturnModelConfig::default())
    }

    /// The configuration in use.
    pub const fn config(&self) -> &ReturnModelConfig {
        &self.config
    }

    /// Uncapped annualised return from the first to the last close.
    pub fn annualized_return(&self, series: &PriceSeries) -> Result<f64, ModelError> {
        let (start, end) = match (series.first(), series.last()) {
            (Some(start), Some(end)) if series.len() >= 2 => (start.close, end.close),
            _ => {
                return Err(ModelError::InsufficientData {
                    ticker: None,
                    required: 2,
                    actual: series.len(),
                });
            }
        };

        for price in [start, end] {
            if !is_valid_price(price) {
                return Err(ModelError::InvalidPrice {
                    ticker: None,
                    price,
                });
            }
        }

        Ok((end / start).powf(1.0 / self.config.years) - 1.0)
    }

    /// Annualised return limited to the configured cap.
    pub fn capped_return(&self, series: &PriceSeries) -> Result<f64, ModelError> {
        self.annualized_return(series)
            .map(|r| r.min(self.config.cap))
    }
}

/// Capped annualised return per ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnMap {
    returns: BTreeMap<Ticker, f64>,
}

impl ReturnMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the return of `ticker`.
    pub fn insert(&mut self, ticker: Ticker, value: f64) -> Option<f64> {
        self.returns.insert(ticker, value)
    }

    /// Return of `ticker`.
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.returns.get(ticker).copied()
    }

    /// Whether `ticker` has a return.
    pub fn contains(&self, ticker: &str) -> bool {
        self.returns.contains_key(ticker)
    }

    /// Tickers in order.
    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.returns.keys()
    }

    /// Iterate in ticker order.
    pub fn iter(&self) -> btree_map::Iter<'_, Ticker, f64> {
        self.returns.iter()
    }

    /// Number of tickers.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

impl FromIterator<(Ticker, f64)> for ReturnMap {
    fn from_iter<I: IntoIterator<Item = (Ticker, f64)>>(iter: I) -> Self {
        Self {
            returns: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ReturnMap {
    type Item = (&'a Ticker, &'a f64);
    type IntoIter = btree_map::Iter<'a, Ticker, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.returns.iter()
    }
}

/// Build the capped return of every ticker in `history`.
///
/// # Errors
/// Only an invalid `config` fails the whole batch; per-ticker failures are
/// reported in [`BatchOutcome::excluded`].
pub fn build_return_map(
    history: &PriceHistory,
    config: &ReturnModelConfig,
) -> Result<BatchOutcome<ReturnMap>, ModelError> {
    let estimator = GeometricReturnEstimator::new(*config)?;
    let mut returns = ReturnMap::new();
    let mut excluded = Vec::new();

    for (ticker, prices) in history {
        match estimator.capped_return(prices) {
            Ok(value) => {
                returns.insert(ticker.clone(), value);
            }
            Err(error) => excluded.push(exclude(ticker, error)),
        }
    }

    tracing::info!(
        tickers = returns.len(),
        excluded = excluded.len(),
        cap = config.cap,
        "built return map"
    );
    Ok(BatchOutcome::new(returns, excluded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rstest::rstest;
    use wealthspread_data::PricePoint;

    fn series(closes: &[f64]) -> PriceSeries {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PricePoint::new(NaiveDate::from_ymd_opt(2020 + i as i32, 2, 3).unwrap(), c)
            })
            .collect()
    }

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    #[test]
    fn test_annualized_return() {
        let estimator = GeometricReturnEstimator::try_default().unwrap();
        // Doubling over five years
        let r = estimator
            .annualized_return(&series(&[50.0, 70.0, 100.0]))
            .unwrap();
        assert_relative_eq!(r, 2f64.powf(0.2) - 1.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(100.0, 110.0, false)]
    #[case(100.0, 1000.0, true)]
    fn test_cap(#[case] start: f64, #[case] end: f64, #[case] capped: bool) {
        let estimator = GeometricReturnEstimator::try_default().unwrap();
        let raw = estimator.annualized_return(&series(&[start, end])).unwrap();
        let value = estimator.capped_return(&series(&[start, end])).unwrap();

        assert!(value <= 0.45);
        if capped {
            assert_eq!(value, 0.45);
        } else {
            assert_eq!(value, raw);
        }
    }

    #[rstest]
    #[case(0.0, 100.0)]
    #[case(100.0, -1.0)]
    #[case(f64::NAN, 100.0)]
    fn test_invalid_endpoint(#[case] start: f64, #[case] end: f64) {
        let estimator = GeometricReturnEstimator::try_default().unwrap();
        let result = estimator.annualized_return(&series(&[start, 90.0, end]));
        assert!(matches!(result, Err(ModelError::InvalidPrice { .. })));
    }

    #[test]
    fn test_insufficient_data() {
        let estimator = GeometricReturnEstimator::try_default().unwrap();
        let result = estimator.annualized_return(&series(&[100.0]));
        assert!(matches!(
            result,
            Err(ModelError::InsufficientData { actual: 1, .. })
        ));
    }

    #[rstest]
    #[case(0.0, 0.45)]
    #[case(-1.0, 0.45)]
    #[case(f64::NAN, 0.45)]
    #[case(5.0, f64::INFINITY)]
    fn test_invalid_config(#[case] years: f64, #[case] cap: f64) {
        let config = ReturnModelConfig { years, cap };
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(build_return_map(&PriceHistory::new(), &config).is_err());
    }

    #[test]
    fn test_build_return_map() {
        let history: PriceHistory = [
            (t("AAPL"), series(&[100.0, 120.0, 150.0])),
            (t("NVDA"), series(&[10.0, 200.0])),
            (t("BAD"), series(&[0.0, 10.0])),
            (t("ONE"), series(&[10.0])),
        ]
        .into_iter()
        .collect();

        let outcome = build_return_map(&history, &ReturnModelConfig::default()).unwrap();
        let map = &outcome.artifact;

        assert_eq!(map.len(), 2);
        assert_relative_eq!(map.get("AAPL").unwrap(), 1.5f64.powf(0.2) - 1.0);
        assert_eq!(map.get("NVDA"), Some(0.45));

        let excluded: Vec<&str> = outcome.excluded.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(excluded, vec!["BAD", "ONE"]);
        assert!(matches!(
            &outcome.excluded[0].error,
            ModelError::InvalidPrice { ticker: Some(bad), .. } if bad.as_str() == "BAD"
        ));
    }
}
