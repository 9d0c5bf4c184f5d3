//! Ticker symbols.

use crate::error::{DataError, Result};
use derive_more::{Display, Into};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::str::FromStr;

/// Maximum number of characters in a ticker symbol.
pub const MAX_TICKER_LEN: usize = 5;

/// An upper-cased exchange ticker such as `AAPL` or `BRK.B`.
///
/// Tickers are validated on construction: 1 to 5 characters drawn from
/// ASCII letters, digits, `.` and `-`. Surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Into, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Parse and normalize a ticker symbol.
    pub fn new(symbol: impl AsRef<str>) -> Result<Self> {
        let normalized = symbol.as_ref().trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }
        if normalized.chars().count() > MAX_TICKER_LEN {
            return Err(DataError::InvalidSymbol(format!(
                "{} is longer than {} characters",
                normalized, MAX_TICKER_LEN
            )));
        }
        if let Some(bad) = normalized
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '-'))
        {
            return Err(DataError::InvalidSymbol(format!(
                "{} contains invalid character {:?}",
                normalized, bad
            )));
        }

        Ok(Self(normalized))
    }

    /// The symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = DataError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}
