//! Descriptive security metadata used to decorate suggestions.

use crate::error::Result;
use crate::ticker::Ticker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Display metadata for a security. Values are kept as the provider
/// formatted them (for example `"$3.41T"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityInfo {
    /// Company name.
    pub company_name: String,
    /// Sector name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Market capitalisation as displayed by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<String>,
    /// Last price as displayed by the provider.
    #[serde(
        default,
        rename = "stock_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_price: Option<String>,
}

impl SecurityInfo {
    /// Metadata with only a company name.
    pub fn named(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            ..Self::default()
        }
    }
}

/// Ticker → metadata lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityDirectory {
    entries: BTreeMap<Ticker, SecurityInfo>,
}

impl SecurityDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace metadata for a ticker.
    pub fn insert(&mut self, ticker: Ticker, info: SecurityInfo) -> Option<SecurityInfo> {
        self.entries.insert(ticker, info)
    }

    /// Metadata for a ticker.
    pub fn get(&self, ticker: &str) -> Option<&SecurityInfo> {
        self.entries.get(ticker)
    }

    /// Company name, falling back to the ticker itself.
    pub fn display_name<'a>(&'a self, ticker: &'a str) -> &'a str {
        self.get(ticker).map_or(ticker, |info| info.company_name.as_str())
    }

    /// Tickers in lexicographic order.
    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.entries.keys()
    }

    /// Iterate in ticker order.
    pub fn iter(&self) -> btree_map::Iter<'_, Ticker, SecurityInfo> {
        self.entries.iter()
    }

    /// Number of securities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the `{ticker: {company_name, market_cap, stock_price}}` layout.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, SecurityInfo> = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Load the `{ticker: {company_name, market_cap, stock_price}}` layout.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let raw: BTreeMap<String, SecurityInfo> = serde_json::from_reader(reader)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: BTreeMap<String, SecurityInfo>) -> Self {
        raw.into_iter()
            .filter_map(|(symbol, info)| match Ticker::new(&symbol) {
                Ok(ticker) => Some((ticker, info)),
                Err(e) => {
                    tracing::warn!(%symbol, error = %e, "skipping security");
                    None
                }
            })
            .collect()
    }
}

impl FromIterator<(Ticker, SecurityInfo)> for SecurityDirectory {
    fn from_iter<I: IntoIterator<Item = (Ticker, SecurityInfo)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
