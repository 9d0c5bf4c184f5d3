//! Export of suggestions.
//!
//! A [`Suggestion`] only carries tickers and numbers; the export decorates
//! each candidate with the company metadata the caller has on file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use wealthspread_data::{SecurityDirectory, Ticker};
use wealthspread_model::ModelError;
use wealthspread_suggest::{EsgBlend, ScoredCandidate, Suggestion};

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Loaded data does not form a valid model.
    #[error("Invalid model data: {0}")]
    Model(#[from] ModelError),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// A scored candidate with display metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateExport {
    /// Rank among scored candidates, starting at 1.
    pub rank: usize,

    /// Security symbol.
    pub ticker: Ticker,

    /// Company name, or the ticker when unknown.
    pub company_name: String,

    /// Sector, when known.
    pub sector: Option<String>,

    /// Market capitalisation as displayed by the provider.
    pub market_cap: Option<String>,

    /// Last price as displayed by the provider.
    pub current_price: Option<String>,

    /// Sharpe-like score of the portfolio including this candidate.
    pub sharpe_ratio: f64,

    /// Weighted correlation of that portfolio.
    pub correlation: f64,

    /// Expected return of that portfolio.
    pub expected_return: f64,
}

impl CandidateExport {
    /// Decorate `candidate` with metadata from `directory`.
    pub fn new(rank: usize, candidate: &ScoredCandidate, directory: &SecurityDirectory) -> Self {
        let info = directory.get(candidate.ticker.as_str());
        Self {
            rank,
            ticker: candidate.ticker.clone(),
            company_name: directory
                .display_name(candidate.ticker.as_str())
                .to_string(),
            sector: info.and_then(|i| i.sector.clone()),
            market_cap: info.and_then(|i| i.market_cap.clone()),
            current_price: info.and_then(|i| i.current_price.clone()),
            sharpe_ratio: candidate.score,
            correlation: candidate.weighted_correlation,
            expected_return: candidate.expected_return,
        }
    }
}

/// Suggestion export data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionExport {
    /// Export timestamp.
    pub generated_at: DateTime<Utc>,

    /// New money to invest.
    pub investment_amount: f64,

    /// The suggested addition.
    pub suggestion: CandidateExport,

    /// ESG risk before and after the addition.
    pub esg: EsgBlend,

    /// Top ranked candidates, the suggestion first.
    pub alternatives: Vec<CandidateExport>,

    /// Candidates tried.
    pub evaluated: usize,

    /// Candidates that produced a score.
    pub scored: usize,
}

impl SuggestionExport {
    /// Build the export of `suggestion`.
    pub fn new(suggestion: &Suggestion, directory: &SecurityDirectory) -> Self {
        Self {
            generated_at: Utc::now(),
            investment_amount: suggestion.investment_amount,
            suggestion: CandidateExport::new(1, &suggestion.best, directory),
            esg: suggestion.esg.clone(),
            alternatives: suggestion
                .alternatives
                .iter()
                .enumerate()
                .map(|(i, c)| CandidateExport::new(i + 1, c, directory))
                .collect(),
            evaluated: suggestion.evaluated,
            scored: suggestion.scored,
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for SuggestionExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                // One row per ranked candidate
                let mut wtr = csv::Writer::from_writer(vec![]);
                for candidate in &self.alternatives {
                    wtr.serialize(candidate)?;
                }
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wealthspread_data::SecurityInfo;
    use wealthspread_suggest::Holdings;

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn candidate(s: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            ticker: t(s),
            score,
            weighted_correlation: 0.6,
            expected_return: 0.06,
        }
    }

    fn suggestion() -> Suggestion {
        Suggestion {
            holdings: Holdings::from([(t("AAPL"), 1000.0)]),
            investment_amount: 1000.0,
            best: candidate("GOOG", 0.1),
            alternatives: vec![candidate("GOOG", 0.1), candidate("MSFT", 0.05)],
            esg: EsgBlend {
                before: 17.2,
                after: 20.1,
                delta: 2.9,
                missing: vec![],
            },
            evaluated: 2,
            scored: 2,
        }
    }

    fn directory() -> SecurityDirectory {
        let mut directory = SecurityDirectory::new();
        directory.insert(
            t("GOOG"),
            SecurityInfo {
                company_name: "Alphabet Inc.".to_string(),
                sector: Some("Communication Services".to_string()),
                market_cap: Some("$2.31T".to_string()),
                current_price: Some("189.30".to_string()),
            },
        );
        directory
    }

    #[test]
    fn test_decoration() {
        let export = SuggestionExport::new(&suggestion(), &directory());

        assert_eq!(export.suggestion.company_name, "Alphabet Inc.");
        assert_eq!(export.suggestion.market_cap.as_deref(), Some("$2.31T"));
        assert_eq!(export.alternatives[1].company_name, "MSFT");
        assert_eq!(export.alternatives[1].market_cap, None);
        assert_eq!(export.alternatives[1].rank, 2);
    }

    #[test]
    fn test_json_round_trip() {
        let export = SuggestionExport::new(&suggestion(), &directory());
        let json = export.export_to_string(ExportFormat::PrettyJson).unwrap();

        assert!(json.contains("\"sharpe_ratio\": 0.1"));
        let back: SuggestionExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, export);
    }

    #[test]
    fn test_csv() {
        let export = SuggestionExport::new(&suggestion(), &directory());
        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rank,ticker,company_name"));
        assert!(lines[1].starts_with("1,GOOG,Alphabet Inc.,Communication Services"));
        assert!(lines[2].starts_with("2,MSFT,MSFT,,,"));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("suggestion.{}", ExportFormat::Json.extension()));

        let export = SuggestionExport::new(&suggestion(), &directory());
        export.export_to_file(&path, ExportFormat::Json).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"GOOG\""));
    }
}
