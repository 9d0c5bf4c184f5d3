//! Twelve Data market data provider.
//!
//! Daily closes come from the `time_series` endpoint in its semicolon
//! separated CSV format. Raw responses are cached on disk under a file name
//! derived from the request URL so repeated refreshes do not spend API
//! credits.

pub mod client;
pub mod csv;

pub use self::csv::parse_time_series_csv;
pub use client::{TwelveDataClient, url_to_cache_key};
