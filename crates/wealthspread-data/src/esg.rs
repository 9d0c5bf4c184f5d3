//! ESG risk scores.
//!
//! Scores follow the Sustainalytics convention used by Yahoo Finance: a
//! higher total means more unmanaged ESG risk. Providers either return the
//! four component scores or nothing at all, so each ticker maps to an
//! [`EsgEntry`] that is explicitly `Available` or `Unavailable`.

use crate::error::Result;
use crate::ticker::Ticker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default tolerance for [`EsgScore::is_consistent`].
pub const DEFAULT_COMPONENT_TOLERANCE: f64 = 0.5;

/// Structured ESG risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EsgScore {
    /// Total ESG risk (`totalEsg`).
    #[serde(rename = "totalEsg")]
    pub total: f64,
    /// Environmental risk (`environmentScore`).
    #[serde(rename = "environmentScore")]
    pub environmental: f64,
    /// Social risk (`socialScore`).
    #[serde(rename = "socialScore")]
    pub social: f64,
    /// Governance risk (`governanceScore`).
    #[serde(rename = "governanceScore")]
    pub governance: f64,
}

impl EsgScore {
    /// Create a new score.
    pub const fn new(total: f64, environmental: f64, social: f64, governance: f64) -> Self {
        Self {
            total,
            environmental,
            social,
            governance,
        }
    }

    /// Whether `total` matches the component sum within `tolerance`.
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        (self.total - (self.environmental + self.social + self.governance)).abs() <= tolerance
    }

    /// Risk ranking of the total score.
    pub fn risk_level(&self) -> EsgRiskLevel {
        EsgRiskLevel::from_total(self.total)
    }
}

/// Simplified Sustainalytics risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EsgRiskLevel {
    /// Total of 15 or less.
    Low,
    /// Total above 15 and up to 25.
    Medium,
    /// Total above 25.
    High,
}

impl EsgRiskLevel {
    /// Rank a total ESG risk score.
    pub fn from_total(total: f64) -> Self {
        if total <= 15.0 {
            Self::Low
        } else if total <= 25.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Short label.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Label with a qualitative hint for display.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk (excellent)",
            Self::Medium => "Medium risk (average)",
            Self::High => "High risk (concerning)",
        }
    }
}

impl fmt::Display for EsgRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ESG data for one ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EsgEntry {
    /// Provider returned a structured score.
    Available(EsgScore),
    /// Provider had no data for the ticker.
    Unavailable,
}

impl EsgEntry {
    /// The score, if available.
    pub const fn score(&self) -> Option<&EsgScore> {
        match self {
            Self::Available(score) => Some(score),
            Self::Unavailable => None,
        }
    }

    /// Total score, or `None` when unavailable.
    pub fn total(&self) -> Option<f64> {
        self.score().map(|s| s.total)
    }

    /// Whether a score is available.
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Shapes seen in ESG files: a flat record, a record nested under
/// `esgScores`, or a free-text "no data" message.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEsgEntry {
    Flat(EsgScore),
    Nested {
        #[serde(rename = "esgScores")]
        esg_scores: EsgScore,
    },
    Other(serde::de::IgnoredAny),
}

impl From<RawEsgEntry> for EsgEntry {
    fn from(raw: RawEsgEntry) -> Self {
        match raw {
            RawEsgEntry::Flat(score) | RawEsgEntry::Nested { esg_scores: score } => {
                Self::Available(score)
            }
            RawEsgEntry::Other(_) => Self::Unavailable,
        }
    }
}

/// Serialized form: scores as records, unavailable entries as the legacy
/// sentinel string.
#[derive(Serialize)]
#[serde(untagged)]
enum StoredEsgEntry {
    Available(EsgScore),
    Unavailable(String),
}

/// Read-only mapping from ticker to ESG entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EsgScores {
    entries: BTreeMap<Ticker, EsgEntry>,
}

impl EsgScores {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, ticker: Ticker, entry: EsgEntry) -> Option<EsgEntry> {
        self.entries.insert(ticker, entry)
    }

    /// Entry for a ticker; `None` when the ticker was never looked up.
    pub fn get(&self, ticker: &str) -> Option<&EsgEntry> {
        self.entries.get(ticker)
    }

    /// Total score for a ticker, treating unknown tickers as unavailable.
    pub fn total(&self, ticker: &str) -> Option<f64> {
        self.get(ticker).and_then(EsgEntry::total)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in ticker order.
    pub fn iter(&self) -> btree_map::Iter<'_, Ticker, EsgEntry> {
        self.entries.iter()
    }

    /// Parse the ESG JSON layout.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawEsgEntry> = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Load the ESG JSON layout from a file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let raw: BTreeMap<String, RawEsgEntry> = serde_json::from_reader(reader)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: BTreeMap<String, RawEsgEntry>) -> Self {
        let mut scores = Self::new();
        for (symbol, entry) in raw {
            match Ticker::new(&symbol) {
                Ok(ticker) => {
                    let entry = EsgEntry::from(entry);
                    if let EsgEntry::Available(score) = &entry {
                        if !score.is_consistent(DEFAULT_COMPONENT_TOLERANCE) {
                            tracing::debug!(%ticker, total = score.total, "ESG components do not sum to total");
                        }
                    }
                    scores.insert(ticker, entry);
                }
                Err(e) => tracing::warn!(%symbol, error = %e, "skipping ESG entry"),
            }
        }
        scores
    }

    /// Serialize to the ESG JSON layout.
    pub fn to_json_string(&self) -> Result<String> {
        let stored: BTreeMap<&str, StoredEsgEntry> = self
            .entries
            .iter()
            .map(|(ticker, entry)| {
                let stored = match entry {
                    EsgEntry::Available(score) => StoredEsgEntry::Available(*score),
                    EsgEntry::Unavailable => StoredEsgEntry::Unavailable(format!(
                        "No ESG data available for {}.",
                        ticker
                    )),
                };
                (ticker.as_str(), stored)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&stored)?)
    }
}

impl FromIterator<(Ticker, EsgEntry)> for EsgScores {
    fn from_iter<I: IntoIterator<Item = (Ticker, EsgEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_all_shapes() {
        let json = r#"{
            "AAPL": {"totalEsg": 17.2, "environmentScore": 0.5, "socialScore": 7.4, "governanceScore": 9.3},
            "MSFT": {"esgScores": {"totalEsg": 15.0, "environmentScore": 1.0, "socialScore": 9.0, "governanceScore": 5.0}},
            "XYZ": "No ESG data available for XYZ."
        }"#;

        let scores = EsgScores::from_json_str(json).unwrap();
        assert_eq!(scores.len(), 3);
        assert_relative_eq!(scores.total("AAPL").unwrap(), 17.2);
        assert_relative_eq!(scores.total("MSFT").unwrap(), 15.0);
        assert_eq!(scores.get("XYZ"), Some(&EsgEntry::Unavailable));
        assert_eq!(scores.total("XYZ"), None);
        assert_eq!(scores.total("NONE"), None);
    }

    #[test]
    fn test_unrecognized_shapes_are_unavailable() {
        let json = r#"{
            "A": null,
            "B": 12.5,
            "C": {"totalEsg": 20.0},
            "D": ["totalEsg", 20.0]
        }"#;

        let scores = EsgScores::from_json_str(json).unwrap();
        assert_eq!(scores.len(), 4);
        for ticker in ["A", "B", "C", "D"] {
            assert_eq!(scores.get(ticker), Some(&EsgEntry::Unavailable));
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let scores: EsgScores = vec![
            (
                Ticker::new("A").unwrap(),
                EsgEntry::Available(EsgScore::new(10.0, 3.0, 4.0, 3.0)),
            ),
            (Ticker::new("B").unwrap(), EsgEntry::Unavailable),
        ]
        .into_iter()
        .collect();

        let json = scores.to_json_string().unwrap();
        assert!(json.contains("No ESG data available for B."));
        assert_eq!(EsgScores::from_json_str(&json).unwrap(), scores);
    }

    #[test]
    fn test_consistency() {
        assert!(EsgScore::new(10.0, 3.0, 4.0, 3.0).is_consistent(1e-9));
        assert!(!EsgScore::new(12.0, 3.0, 4.0, 3.0).is_consistent(0.5));
    }

    #[rstest]
    #[case(10.0, EsgRiskLevel::Low)]
    #[case(15.0, EsgRiskLevel::Low)]
    #[case(15.1, EsgRiskLevel::Medium)]
    #[case(25.0, EsgRiskLevel::Medium)]
    #[case(31.4, EsgRiskLevel::High)]
    fn test_risk_level(#[case] total: f64, #[case] expected: EsgRiskLevel) {
        assert_eq!(EsgRiskLevel::from_total(total), expected);
    }
}
