//! Percent-change return series.
//!
//! Each entry is the relative change between two consecutive closes,
//! multiplied by 100 and keyed by the later date:
//!
//! r_t = (P_t - P_{t-1}) / P_{t-1} * 100
//!
//! Values are rounded to a fixed number of decimals so the correlation
//! builder sees the same inputs no matter how the closes were parsed.

use crate::ModelError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wealthspread_data::PriceSeries;

/// Percent changes keyed by the later of the two dates.
pub type PercentChangeSeries = BTreeMap<NaiveDate, f64>;

/// Return series configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSeriesConfig {
    /// Decimal digits kept in each percent change (default: 4)
    pub precision: u32,
}

impl Default for ReturnSeriesConfig {
    fn default() -> Self {
        Self { precision: 4 }
    }
}

/// Percent changes of `series` with the default precision.
///
/// # Errors
/// [`ModelError::InsufficientData`] for fewer than 2 closes,
/// [`ModelError::InvalidPrice`] when a close is non-positive or not finite.
pub fn percent_changes(series: &PriceSeries) -> Result<PercentChangeSeries, ModelError> {
    percent_changes_with(series, &ReturnSeriesConfig::default())
}

/// Percent changes of `series` rounded to `config.precision` decimals.
pub fn percent_changes_with(
    series: &PriceSeries,
    config: &ReturnSeriesConfig,
) -> Result<PercentChangeSeries, ModelError> {
    let points = series.points();
    if points.len() < 2 {
        return Err(ModelError::InsufficientData {
            ticker: None,
            required: 2,
            actual: points.len(),
        });
    }

    if let Some(bad) = points.iter().find(|p| !is_valid_price(p.close)) {
        return Err(ModelError::InvalidPrice {
            ticker: None,
            price: bad.close,
        });
    }

    let scale = 10f64.powi(config.precision as i32);
    Ok(points
        .windows(2)
        .map(|pair| {
            let change = (pair[1].close - pair[0].close) / pair[0].close * 100.0;
            (pair[1].date, (change * scale).round() / scale)
        })
        .collect())
}

pub(crate) fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;
    use wealthspread_data::PricePoint;

    fn series(closes: &[f64]) -> PriceSeries {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PricePoint::new(
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                    c,
                )
            })
            .collect()
    }

    #[test]
    fn test_percent_changes() {
        let changes = percent_changes(&series(&[100.0, 110.0, 99.0])).unwrap();
        let values: Vec<f64> = changes.values().copied().collect();
        assert_eq!(values, vec![10.0, -10.0]);

        let first_key = *changes.keys().next().unwrap();
        assert_eq!(first_key, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_length_and_reconstruction() {
        let closes = [187.15, 185.64, 184.25, 181.91, 181.18, 185.56];
        let changes = percent_changes(&series(&closes)).unwrap();
        assert_eq!(changes.len(), closes.len() - 1);

        let first = changes.values().next().unwrap();
        let rebuilt = closes[0] * (1.0 + first / 100.0);
        // 4 decimals of a percent bound the error to 0.5e-6 of the price
        assert_abs_diff_eq!(rebuilt, closes[1], epsilon = closes[0] * 1e-6);
    }

    #[test]
    fn test_rounding() {
        let changes = percent_changes(&series(&[3.0, 4.0])).unwrap();
        assert_eq!(changes.values().next().copied(), Some(33.3333));

        let config = ReturnSeriesConfig { precision: 1 };
        let changes = percent_changes_with(&series(&[3.0, 4.0]), &config).unwrap();
        assert_eq!(changes.values().next().copied(), Some(33.3));
    }

    #[rstest]
    #[case(&[])]
    #[case(&[100.0])]
    fn test_insufficient_data(#[case] closes: &[f64]) {
        let err = percent_changes(&series(closes)).unwrap_err();
        assert_eq!(
            err,
            ModelError::InsufficientData {
                ticker: None,
                required: 2,
                actual: closes.len()
            }
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_price(#[case] bad: f64) {
        let result = percent_changes(&series(&[100.0, bad, 101.0]));
        assert!(matches!(result, Err(ModelError::InvalidPrice { .. })));
    }
}
