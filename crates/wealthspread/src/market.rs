//! The pair of refresh artifacts the candidate search runs against.

use std::path::Path;
use thiserror::Error;
use wealthspread_data::{EsgScores, PriceHistory};
use wealthspread_model::{
    CorrelationMatrix, ExcludedTicker, ModelError, ReturnMap, ReturnModelConfig,
    build_correlation_matrix, build_return_map,
};
use wealthspread_output::{
    CORRELATION_FILE, ExportError, RETURN_MAP_FILE, load_correlation_csv, load_return_map,
    save_correlation_csv, save_return_map,
};
use wealthspread_suggest::MarketArtifacts;

/// Errors raised while refreshing or loading a [`MarketModel`].
#[derive(Debug, Error)]
pub enum MarketError {
    /// Model construction failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Reading or writing artifacts failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// No artifacts were found in the directory.
    #[error("no market model in {0}; run a refresh first")]
    NotBuilt(String),
}

/// Correlation matrix and return map from the same refresh.
#[derive(Debug, Clone)]
pub struct MarketModel {
    /// Pairwise correlations of daily percent changes.
    pub correlations: CorrelationMatrix,
    /// Capped annualised geometric returns.
    pub returns: ReturnMap,
}

/// Result of [`MarketModel::refresh`].
#[derive(Debug, Clone)]
pub struct Refresh {
    /// The rebuilt model.
    pub model: MarketModel,
    /// Tickers left out of the correlation matrix.
    pub correlations_excluded: Vec<ExcludedTicker>,
    /// Tickers left out of the return map.
    pub returns_excluded: Vec<ExcludedTicker>,
}

impl MarketModel {
    /// Rebuild both artifacts from `history`.
    pub fn refresh(history: &PriceHistory, config: &ReturnModelConfig) -> Result<Refresh, MarketError> {
        let correlations = build_correlation_matrix(history);
        let returns = build_return_map(history, config)?;
        tracing::info!(
            tickers = history.len(),
            correlated = correlations.artifact.len(),
            with_returns = returns.artifact.len(),
            "refreshed market model"
        );
        Ok(Refresh {
            model: Self {
                correlations: correlations.artifact,
                returns: returns.artifact,
            },
            correlations_excluded: correlations.excluded,
            returns_excluded: returns.excluded,
        })
    }

    /// Write both artifacts into `dir` under their conventional names.
    pub fn save(&self, dir: &Path) -> Result<(), MarketError> {
        std::fs::create_dir_all(dir).map_err(ExportError::from)?;
        save_correlation_csv(&self.correlations, &dir.join(CORRELATION_FILE))?;
        save_return_map(&self.returns, &dir.join(RETURN_MAP_FILE))?;
        Ok(())
    }

    /// Load the artifacts written by [`save`](Self::save).
    pub fn load(dir: &Path) -> Result<Self, MarketError> {
        let matrix_path = dir.join(CORRELATION_FILE);
        let returns_path = dir.join(RETURN_MAP_FILE);
        if !matrix_path.exists() || !returns_path.exists() {
            return Err(MarketError::NotBuilt(dir.display().to_string()));
        }
        Ok(Self {
            correlations: load_correlation_csv(&matrix_path)?,
            returns: load_return_map(&returns_path)?,
        })
    }

    /// Borrow the artifacts for a search, alongside `esg`.
    pub const fn artifacts<'a>(&'a self, esg: &'a EsgScores) -> MarketArtifacts<'a> {
        MarketArtifacts {
            correlations: &self.correlations,
            returns: &self.returns,
            esg,
        }
    }
}
