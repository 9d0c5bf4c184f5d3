//! Daily closing price series and the price history store.

use crate::error::{DataError, Result};
use crate::ticker::Ticker;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Chronologically ordered closes for one security, with unique dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points in any order.
    ///
    /// Points are sorted by date. When a date repeats, the last point given
    /// for it wins.
    pub fn new(points: impl IntoIterator<Item = PricePoint>) -> Self {
        let by_date: BTreeMap<NaiveDate, f64> =
            points.into_iter().map(|p| (p.date, p.close)).collect();
        Self {
            points: by_date
                .into_iter()
                .map(|(date, close)| PricePoint::new(date, close))
                .collect(),
        }
    }

    /// Points in chronological order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest observation.
    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    /// Latest observation.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

impl FromIterator<PricePoint> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = PricePoint>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Read-only mapping from ticker to its price series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    series: BTreeMap<Ticker, PriceSeries>,
}

/// A close as stored on disk: providers emit both `"182.5"` and `182.5`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawClose {
    Number(f64),
    Text(String),
}

impl RawClose {
    fn value(&self) -> Result<f64> {
        match self {
            Self::Number(v) => Ok(*v),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| DataError::Parse(format!("Invalid close {:?}: {}", s, e))),
        }
    }
}

/// Parse a date that may carry a time suffix (`2024-01-02 00:00:00`).
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("Invalid date {:?}: {}", raw, e)))
}

impl PriceHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the series for a ticker.
    pub fn insert(&mut self, ticker: Ticker, series: PriceSeries) -> Option<PriceSeries> {
        self.series.insert(ticker, series)
    }

    /// Series for a ticker.
    pub fn get(&self, ticker: &str) -> Option<&PriceSeries> {
        self.series.get(ticker)
    }

    /// Whether a ticker has a series.
    pub fn contains(&self, ticker: &str) -> bool {
        self.series.contains_key(ticker)
    }

    /// Tickers in lexicographic order.
    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.series.keys()
    }

    /// Iterate over `(ticker, series)` in lexicographic ticker order.
    pub fn iter(&self) -> btree_map::Iter<'_, Ticker, PriceSeries> {
        self.series.iter()
    }

    /// Number of tickers.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Parse the `{ticker: {date: close}}` JSON layout.
    ///
    /// Entries with an invalid ticker or an unparseable date/close are
    /// skipped with a warning so one bad symbol does not discard the file.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, RawClose>> = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Load the `{ticker: {date: close}}` JSON layout from a file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let raw: BTreeMap<String, BTreeMap<String, RawClose>> = serde_json::from_reader(reader)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: BTreeMap<String, BTreeMap<String, RawClose>>) -> Self {
        let mut history = Self::new();

        for (symbol, closes) in raw {
            let ticker = match Ticker::new(&symbol) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(%symbol, error = %e, "skipping price series");
                    continue;
                }
            };

            let points: Result<Vec<PricePoint>> = closes
                .iter()
                .map(|(date, close)| Ok(PricePoint::new(parse_date(date)?, close.value()?)))
                .collect();

            match points {
                Ok(points) => {
                    history.insert(ticker, PriceSeries::new(points));
                }
                Err(e) => {
                    tracing::warn!(%ticker, error = %e, "skipping price series");
                }
            }
        }

        history
    }

    /// Serialize to the `{ticker: {date: close}}` JSON layout.
    pub fn to_json_string(&self) -> Result<String> {
        let raw: BTreeMap<&str, BTreeMap<String, f64>> = self
            .series
            .iter()
            .map(|(ticker, series)| {
                (
                    ticker.as_str(),
                    series
                        .points()
                        .iter()
                        .map(|p| (p.date.to_string(), p.close))
                        .collect(),
                )
            })
            .collect();
        Ok(serde_json::to_string_pretty(&raw)?)
    }
}

impl FromIterator<(Ticker, PriceSeries)> for PriceHistory {
    fn from_iter<I: IntoIterator<Item = (Ticker, PriceSeries)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PriceHistory {
    type Item = (&'a Ticker, &'a PriceSeries);
    type IntoIter = btree_map::Iter<'a, Ticker, PriceSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}
