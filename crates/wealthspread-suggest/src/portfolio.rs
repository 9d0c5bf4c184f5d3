//! Holdings and the weights derived from them.

use crate::SuggestError;
use std::collections::BTreeMap;
use wealthspread_data::Ticker;

/// Currently invested amount per ticker.
pub type Holdings = BTreeMap<Ticker, f64>;

/// Fraction of the portfolio per ticker, summing to 1.
pub type Weights = BTreeMap<Ticker, f64>;

/// Normalise `holdings` into weights.
///
/// An empty or zero-valued portfolio yields empty weights.
pub fn normalize(holdings: &Holdings) -> Weights {
    let total: f64 = holdings.values().sum();
    if total <= 0.0 {
        return Weights::new();
    }
    holdings
        .iter()
        .map(|(ticker, amount)| (ticker.clone(), amount / total))
        .collect()
}

/// Weights after investing `amount` more in `ticker`.
pub fn weights_with_addition(holdings: &Holdings, ticker: &Ticker, amount: f64) -> Weights {
    normalize(&with_addition(holdings, ticker, amount))
}

/// Holdings after investing `amount` more in `ticker`.
pub fn with_addition(holdings: &Holdings, ticker: &Ticker, amount: f64) -> Holdings {
    let mut after = holdings.clone();
    *after.entry(ticker.clone()).or_insert(0.0) += amount;
    after
}

/// Check holdings and the new amount before a search.
pub(crate) fn validate(holdings: &Holdings, amount: f64) -> Result<(), SuggestError> {
    if holdings.is_empty() {
        return Err(SuggestError::InvalidInput(
            "holdings must contain at least one ticker".to_string(),
        ));
    }
    if let Some((ticker, value)) = holdings
        .iter()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(SuggestError::InvalidInput(format!(
            "holding {} has invalid amount {}",
            ticker, value
        )));
    }
    if holdings.values().sum::<f64>() <= 0.0 {
        return Err(SuggestError::InvalidInput(
            "holdings must have a positive total".to_string(),
        ));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SuggestError::InvalidInput(format!(
            "investment amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn holdings(pairs: &[(&str, f64)]) -> Holdings {
        pairs.iter().map(|&(s, a)| (t(s), a)).collect()
    }

    #[test]
    fn test_weights_with_addition() {
        let weights = weights_with_addition(&holdings(&[("AAPL", 1000.0)]), &t("GOOG"), 1000.0);
        assert_eq!(weights.get("AAPL"), Some(&0.5));
        assert_eq!(weights.get("GOOG"), Some(&0.5));

        let weights = weights_with_addition(
            &holdings(&[("A", 500.0), ("B", 500.0)]),
            &t("C"),
            1000.0,
        );
        assert_relative_eq!(weights.values().sum::<f64>(), 1.0);
        assert_eq!(weights.get("C"), Some(&0.5));
    }

    #[test]
    fn test_normalize_zero_total() {
        assert!(normalize(&holdings(&[("A", 0.0)])).is_empty());
    }

    #[rstest]
    #[case(&[], 100.0)]
    #[case(&[("A", -1.0)], 100.0)]
    #[case(&[("A", f64::NAN)], 100.0)]
    #[case(&[("A", 0.0)], 100.0)]
    #[case(&[("A", 100.0)], 0.0)]
    #[case(&[("A", 100.0)], f64::INFINITY)]
    fn test_validate_rejects(#[case] pairs: &[(&str, f64)], #[case] amount: f64) {
        assert!(matches!(
            validate(&holdings(pairs), amount),
            Err(SuggestError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_accepts_zero_entry() {
        assert!(validate(&holdings(&[("A", 0.0), ("B", 10.0)]), 5.0).is_ok());
    }
}
