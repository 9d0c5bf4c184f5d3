//! Pairwise Pearson correlation of percent-change series.
//!
//! Each pair is correlated over the dates both series have in common, so
//! tickers with different coverage never see a gap filled with zero. A pair
//! with fewer than two common dates, or a flat series over those dates, has
//! no defined correlation and is stored as NaN.
//!
//! Tickers are ordered lexicographically and each pair is reduced in date
//! order, so the matrix depends only on the input contents. Only the upper
//! triangle is computed; the lower triangle is a mirror of it.

use crate::ModelError;
use crate::batch::{BatchOutcome, exclude};
use crate::returns::{PercentChangeSeries, percent_changes};
use ndarray::Array2;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use wealthspread_data::{PriceHistory, Ticker};

/// Tolerance used when checking a loaded matrix for symmetry.
const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Square, symmetric correlation matrix indexed by ticker.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    tickers: Vec<Ticker>,
    index: HashMap<Ticker, usize>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Correlate every pair of series.
    ///
    /// The tickers of the result are the keys of `series`, in order.
    pub fn from_percent_changes(series: &BTreeMap<Ticker, PercentChangeSeries>) -> Self {
        let tickers: Vec<Ticker> = series.keys().cloned().collect();
        let columns: Vec<&PercentChangeSeries> = series.values().collect();
        let n = tickers.len();

        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
        let upper: Vec<f64> = pairs
            .par_iter()
            .map(|&(i, j)| pearson(columns[i], columns[j]))
            .collect();

        let mut values = Array2::<f64>::from_elem((n, n), f64::NAN);
        for (i, column) in columns.iter().enumerate() {
            values[[i, i]] = if has_variance(column) { 1.0 } else { f64::NAN };
        }
        for (&(i, j), &r) in pairs.iter().zip(&upper) {
            values[[i, j]] = r;
            values[[j, i]] = r;
        }

        Self::indexed(tickers, values)
    }

    /// Assemble a matrix from ticker labels and values, e.g. after loading
    /// it from disk.
    ///
    /// # Errors
    /// [`ModelError::DimensionMismatch`] when `values` is not `n x n`,
    /// [`ModelError::InvalidParameter`] for a repeated ticker and
    /// [`ModelError::NotSymmetric`] when a mirrored pair differs.
    pub fn from_parts(tickers: Vec<Ticker>, values: Array2<f64>) -> Result<Self, ModelError> {
        let n = tickers.len();
        let (rows, cols) = values.dim();
        if rows != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: rows,
            });
        }
        if cols != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: cols,
            });
        }

        for i in 0..n {
            for j in i + 1..n {
                let (a, b) = (values[[i, j]], values[[j, i]]);
                let same = (a.is_nan() && b.is_nan()) || (a - b).abs() <= SYMMETRY_TOLERANCE;
                if !same {
                    return Err(ModelError::NotSymmetric {
                        row: tickers[i].clone(),
                        col: tickers[j].clone(),
                    });
                }
            }
        }

        let matrix = Self::indexed(tickers, values);
        if matrix.index.len() != n {
            return Err(ModelError::InvalidParameter(
                "Correlation matrix has repeated tickers".to_string(),
            ));
        }
        Ok(matrix)
    }

    fn indexed(tickers: Vec<Ticker>, values: Array2<f64>) -> Self {
        let index = tickers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self {
            tickers,
            index,
            values,
        }
    }

    /// Correlation between `a` and `b`, `None` when either is absent.
    ///
    /// A present but undefined pair is `Some(NaN)`.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.values[[i, j]])
    }

    /// Position of `ticker` in the matrix.
    pub fn index_of(&self, ticker: &str) -> Option<usize> {
        self.index.get(ticker).copied()
    }

    /// Whether `ticker` is part of the matrix.
    pub fn contains(&self, ticker: &str) -> bool {
        self.index.contains_key(ticker)
    }

    /// Tickers in row order.
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Raw values in row order.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of tickers.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    /// True for an empty matrix.
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Build the correlation matrix of every ticker in `history`.
///
/// Tickers whose percent changes cannot be computed are excluded and
/// reported in the outcome.
pub fn build_correlation_matrix(history: &PriceHistory) -> BatchOutcome<CorrelationMatrix> {
    let mut series = BTreeMap::new();
    let mut excluded = Vec::new();

    for (ticker, prices) in history {
        match percent_changes(prices) {
            Ok(changes) => {
                series.insert(ticker.clone(), changes);
            }
            Err(error) => excluded.push(exclude(ticker, error)),
        }
    }

    let matrix = CorrelationMatrix::from_percent_changes(&series);
    tracing::info!(
        tickers = matrix.len(),
        excluded = excluded.len(),
        "built correlation matrix"
    );
    BatchOutcome::new(matrix, excluded)
}

/// Pearson correlation over the common dates of `a` and `b`.
pub fn pearson(a: &PercentChangeSeries, b: &PercentChangeSeries) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .filter_map(|(date, &x)| b.get(date).map(|&y| (x, y)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

fn has_variance(series: &PercentChangeSeries) -> bool {
    if series.len() < 2 {
        return false;
    }
    let mut values = series.values();
    let first = values.next().copied();
    values.any(|&v| Some(v) != first)
}
