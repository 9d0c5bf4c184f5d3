//! HTTP client for the Twelve Data `time_series` endpoint.

use super::csv::parse_time_series_csv;
use crate::error::{DataError, Result};
use crate::prices::PriceSeries;
use crate::ticker::Ticker;
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

/// Characters kept verbatim in cache file names.
const ALLOWED_CACHE_CHARS: &str = "abcdefghijklmnopqrstuvwxyz1234567890%+,^=._";

/// Turn a URL into a file name that is safe to write to disk.
///
/// The key is lower-cased, the scheme is removed and every character
/// outside `ALLOWED_CACHE_CHARS` becomes `_`.
pub fn url_to_cache_key(url: &str) -> String {
    let lowered = url.to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);

    without_scheme
        .chars()
        .map(|c| if ALLOWED_CACHE_CHARS.contains(c) { c } else { '_' })
        .collect()
}

/// Error body returned by the API (it answers errors in JSON even when CSV
/// was requested).
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Twelve Data client with an optional on-disk response cache.
pub struct TwelveDataClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    cache_dir: Option<PathBuf>,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for TwelveDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwelveDataClient")
            .field("base_url", &self.base_url)
            .field("cache_dir", &self.cache_dir)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl TwelveDataClient {
    /// Create a client with the default rate limit (one request per 8 seconds,
    /// the free tier allowance).
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: None,
            rate_limit_delay: Duration::from_millis(8000),
        }
    }

    /// Point the client at another API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Cache raw responses in `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Delay applied after every network request.
    pub const fn with_rate_limit(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    /// Request URL without credentials; also the cache identity.
    fn series_url(&self, ticker: &Ticker, start: NaiveDate, end: NaiveDate) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/time_series", self.base_url),
            &[
                ("interval", "1day"),
                ("symbol", ticker.as_str()),
                ("start_date", &start.to_string()),
                ("end_date", &end.to_string()),
                ("format", "CSV"),
            ],
        )
        .map_err(|e| DataError::Parse(format!("Invalid request URL: {}", e)))
    }

    fn cache_path(&self, url: &Url) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(url_to_cache_key(url.as_str())))
    }

    /// Fetch daily closes for `ticker` between `start` and `end` inclusive.
    pub async fn fetch_series(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let url = self.series_url(ticker, start, end)?;
        let cache_path = self.cache_path(&url);

        if let Some(path) = cache_path.as_deref() {
            match fs::read_to_string(path).await {
                Ok(body) => {
                    tracing::debug!(%ticker, path = %path.display(), "using cached time series");
                    return Self::series_from_body(ticker, &body);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut request_url = url.clone();
        request_url
            .query_pairs_mut()
            .append_pair("apikey", &self.api_key);

        let response = self.http.get(request_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        sleep(self.rate_limit_delay).await;

        if !status.is_success() {
            return Err(DataError::Api(format!(
                "{} returned HTTP {}",
                ticker, status
            )));
        }
        if body.trim_start().starts_with('{') {
            let err: ApiErrorBody = serde_json::from_str(&body)?;
            return Err(DataError::Api(format!(
                "{}: {} (code {})",
                ticker,
                err.message.unwrap_or_else(|| "unknown error".to_string()),
                err.code.unwrap_or_default()
            )));
        }

        let series = Self::series_from_body(ticker, &body)?;

        if let Some(path) = cache_path.as_deref() {
            write_cache_file(path, &body).await?;
            tracing::debug!(%ticker, path = %path.display(), "cached time series");
        }

        Ok(series)
    }

    fn series_from_body(ticker: &Ticker, body: &str) -> Result<PriceSeries> {
        let series = parse_time_series_csv(body)?;
        if series.is_empty() {
            return Err(DataError::MissingData {
                symbol: ticker.to_string(),
                reason: "No rows in time series response".to_string(),
            });
        }
        Ok(series)
    }
}

async fn write_cache_file(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const BODY: &str = "datetime;open;high;low;close;volume\n\
        2025-01-31;1;1;1;110.0;100\n\
        2025-01-30;1;1;1;100.0;100\n";

    fn test_client(server: &mockito::ServerGuard) -> TwelveDataClient {
        TwelveDataClient::new("demo")
            .with_base_url(server.url())
            .with_rate_limit(Duration::ZERO)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_url_to_cache_key() {
        let key = url_to_cache_key(
            "https://api.twelvedata.com/time_series?symbol=AAPL&start_date=2020-02-01",
        );
        assert_eq!(
            key,
            "api.twelvedata.com_time_series_symbol=aapl_start_date=2020_02_01"
        );
        assert_eq!(url_to_cache_key("http://x.io/A"), "x.io_a");
    }

    #[tokio::test]
    async fn test_fetch_series() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/time_series")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "AAPL".into()),
                Matcher::UrlEncoded("interval".into(), "1day".into()),
                Matcher::UrlEncoded("apikey".into(), "demo".into()),
            ]))
            .with_status(200)
            .with_body(BODY)
            .create_async()
            .await;

        let client = test_client(&server);
        let ticker = Ticker::new("AAPL").unwrap();
        let series = client.fetch_series(&ticker, day(1), day(31)).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().close, 100.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_uses_disk_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/time_series")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(BODY)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server).with_cache_dir(dir.path());
        let ticker = Ticker::new("MSFT").unwrap();

        let first = client.fetch_series(&ticker, day(1), day(31)).await.unwrap();
        let second = client.fetch_series(&ticker, day(1), day(31)).await.unwrap();

        assert_eq!(first, second);
        mock.assert_async().await;

        let cached: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_creates_cache_dir_and_reads_seeded_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/time_series")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(BODY)
            .expect(0)
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("responses").join("nested");
        let client = test_client(&server).with_cache_dir(&dir);
        let ticker = Ticker::new("KO").unwrap();

        let url = client.series_url(&ticker, day(1), day(31)).unwrap();
        let path = client.cache_path(&url).unwrap();
        write_cache_file(&path, BODY).await.unwrap();
        assert!(path.exists());

        let series = client.fetch_series(&ticker, day(1), day(31)).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 110.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/time_series")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":401,"message":"invalid api key","status":"error"}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let ticker = Ticker::new("AAPL").unwrap();
        let result = client.fetch_series(&ticker, day(1), day(31)).await;
        assert!(matches!(result, Err(DataError::Api(msg)) if msg.contains("invalid api key")));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/time_series")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = test_client(&server);
        let ticker = Ticker::new("AAPL").unwrap();
        let result = client.fetch_series(&ticker, day(1), day(31)).await;
        assert!(matches!(result, Err(DataError::Api(_))));
    }

    #[tokio::test]
    async fn test_invalid_date_range() {
        let client = TwelveDataClient::new("demo");
        let ticker = Ticker::new("AAPL").unwrap();
        let result = client.fetch_series(&ticker, day(31), day(1)).await;
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }
}
