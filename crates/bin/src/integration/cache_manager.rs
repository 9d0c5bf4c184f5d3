//! Data directory layout.
//!
//! Everything the CLI persists lives under one directory:
//!
//! ```text
//! <data dir>/
//!   wealthspread.db        SQLite cache of closes, ESG scores and metadata
//!   responses/             raw Twelve Data responses
//!   model/                 correlation_matrix.csv, scaled_geometric_mean.json
//! ```

use std::path::{Path, PathBuf};
use wealthspread_data::cache::SqliteCache;
use wealthspread_data::error::DataError;

/// Get the default data directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/wealthspread/`
/// - macOS: `~/Library/Caches/wealthspread/`
/// - Windows: `%LOCALAPPDATA%\wealthspread\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wealthspread")
}

/// Resolved locations inside a data directory.
#[derive(Debug, Clone)]
pub(crate) struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn cache_path(&self) -> PathBuf {
        self.root.join("wealthspread.db")
    }

    pub(crate) fn responses_dir(&self) -> PathBuf {
        self.root.join("responses")
    }

    pub(crate) fn model_dir(&self) -> PathBuf {
        self.root.join("model")
    }

    /// Open the cache, creating the directory if needed.
    pub(crate) fn open_cache(&self) -> Result<SqliteCache, DataError> {
        std::fs::create_dir_all(&self.root)?;
        SqliteCache::new(self.cache_path())
    }
}
