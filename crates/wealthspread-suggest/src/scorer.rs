//! Sharpe-like scoring of a weighted set of securities.
//!
//! For weights w over tickers with correlations M and returns R:
//!
//! weighted correlation = Σ_i Σ_j w_i w_j M_ij / Σ_i w_i
//! expected return      = Σ_i w_i R_i
//! score                = expected return / weighted correlation
//!
//! Callers pass normalised weights; the divisor only absorbs rounding.

use crate::ScoreError;
use crate::portfolio::Weights;
use serde::{Deserialize, Serialize};
use wealthspread_model::{CorrelationMatrix, ReturnMap};

/// Score of one set of weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioScore {
    /// Weighted mean pairwise correlation
    pub weighted_correlation: f64,
    /// Weighted expected return
    pub expected_return: f64,
    /// Expected return divided by weighted correlation
    pub score: f64,
}

/// Score `weights` against the refresh artifacts.
///
/// # Errors
/// See [`ScoreError`]; every variant means the weights cannot be ranked.
pub fn score_portfolio(
    correlations: &CorrelationMatrix,
    returns: &ReturnMap,
    weights: &Weights,
) -> Result<PortfolioScore, ScoreError> {
    let mut rows = Vec::with_capacity(weights.len());
    let mut expected_return = 0.0;
    let mut total_weight = 0.0;

    for (ticker, &weight) in weights {
        let index = correlations
            .index_of(ticker.as_str())
            .ok_or_else(|| ScoreError::MissingTicker {
                ticker: ticker.clone(),
                artifact: "correlation matrix",
            })?;
        let ret = returns
            .get(ticker.as_str())
            .ok_or_else(|| ScoreError::MissingTicker {
                ticker: ticker.clone(),
                artifact: "return map",
            })?;

        rows.push((index, weight));
        expected_return += weight * ret;
        total_weight += weight;
    }

    let values = correlations.values();
    let mut sum = 0.0;
    for &(i, wi) in &rows {
        for &(j, wj) in &rows {
            sum += wi * wj * values[[i, j]];
        }
    }
    let weighted_correlation = sum / total_weight;

    if weighted_correlation.is_nan() || weighted_correlation <= 0.0 {
        return Err(ScoreError::DegenerateCorrelation(weighted_correlation));
    }

    let score = expected_return / weighted_correlation;
    if !expected_return.is_finite() || !score.is_finite() {
        return Err(ScoreError::NonFiniteScore {
            expected_return,
            weighted_correlation,
        });
    }

    Ok(PortfolioScore {
        weighted_correlation,
        expected_return,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use wealthspread_data::Ticker;

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn matrix() -> CorrelationMatrix {
        CorrelationMatrix::from_parts(
            vec![t("AAPL"), t("GOOG"), t("MSFT"), t("FLAT")],
            array![
                [1.0, 0.2, 0.8, f64::NAN],
                [0.2, 1.0, 0.5, f64::NAN],
                [0.8, 0.5, 1.0, f64::NAN],
                [f64::NAN, f64::NAN, f64::NAN, f64::NAN],
            ],
        )
        .unwrap()
    }

    fn returns() -> ReturnMap {
        [
            (t("AAPL"), 0.08),
            (t("GOOG"), 0.12),
            (t("MSFT"), 0.10),
            (t("FLAT"), 0.0),
        ]
        .into_iter()
        .collect()
    }

    fn weights(pairs: &[(&str, f64)]) -> Weights {
        pairs.iter().map(|&(s, w)| (t(s), w)).collect()
    }

    #[test]
    fn test_two_asset_score() {
        let score = score_portfolio(
            &matrix(),
            &returns(),
            &weights(&[("AAPL", 0.5), ("MSFT", 0.5)]),
        )
        .unwrap();

        assert_relative_eq!(score.weighted_correlation, 0.9, epsilon = 1e-12);
        assert_relative_eq!(score.expected_return, 0.09, epsilon = 1e-12);
        assert_relative_eq!(score.score, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_single_asset() {
        let score = score_portfolio(&matrix(), &returns(), &weights(&[("GOOG", 1.0)])).unwrap();
        assert_eq!(score.weighted_correlation, 1.0);
        assert_relative_eq!(score.score, 0.12);
    }

    #[test]
    fn test_missing_ticker() {
        let err = score_portfolio(
            &matrix(),
            &returns(),
            &weights(&[("AAPL", 0.5), ("TSLA", 0.5)]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScoreError::MissingTicker { ref ticker, artifact: "correlation matrix" } if ticker.as_str() == "TSLA"
        ));

        let partial: ReturnMap = [(t("AAPL"), 0.08)].into_iter().collect();
        let err = score_portfolio(
            &matrix(),
            &partial,
            &weights(&[("AAPL", 0.5), ("MSFT", 0.5)]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScoreError::MissingTicker {
                artifact: "return map",
                ..
            }
        ));
    }

    #[test]
    fn test_degenerate_correlation() {
        let err = score_portfolio(
            &matrix(),
            &returns(),
            &weights(&[("AAPL", 0.5), ("FLAT", 0.5)]),
        )
        .unwrap_err();
        assert!(matches!(err, ScoreError::DegenerateCorrelation(c) if c.is_nan()));

        let negative = CorrelationMatrix::from_parts(
            vec![t("AAPL"), t("MSFT")],
            array![[1.0, -1.0], [-1.0, 1.0]],
        )
        .unwrap();
        let err = score_portfolio(
            &negative,
            &returns(),
            &weights(&[("AAPL", 0.5), ("MSFT", 0.5)]),
        )
        .unwrap_err();
        assert_eq!(err, ScoreError::DegenerateCorrelation(0.0));
    }

    #[test]
    fn test_non_finite_return() {
        let bad: ReturnMap = [(t("AAPL"), f64::NAN), (t("MSFT"), 0.1)]
            .into_iter()
            .collect();
        let err = score_portfolio(&matrix(), &bad, &weights(&[("AAPL", 0.5), ("MSFT", 0.5)]))
            .unwrap_err();
        assert!(matches!(err, ScoreError::NonFiniteScore { .. }));
    }

    #[test]
    fn test_weight_order_independent() {
        let forward = weights(&[("AAPL", 0.2), ("GOOG", 0.3), ("MSFT", 0.5)]);
        let mut backward = Weights::new();
        backward.insert(t("MSFT"), 0.5);
        backward.insert(t("GOOG"), 0.3);
        backward.insert(t("AAPL"), 0.2);

        let a = score_portfolio(&matrix(), &returns(), &forward).unwrap();
        let b = score_portfolio(&matrix(), &returns(), &backward).unwrap();
        assert_eq!(a, b);
    }
}
