//! Data pipeline for filling the SQLite cache.
//!
//! Daily closes come from Twelve Data; ESG scores and security metadata
//! come from the JSON files the scrapers produced. The cache is checked
//! first so repeated runs only fetch what is missing.

use chrono::{Days, NaiveDate};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::path::Path;
use wealthspread_data::cache::SqliteCache;
use wealthspread_data::error::DataError;
use wealthspread_data::twelvedata::TwelveDataClient;
use wealthspread_data::{EsgScores, PriceHistory, SecurityDirectory, Ticker};

/// Default number of concurrent fetches. The free API tier allows eight
/// requests per minute, so anything above one only helps paid plans.
pub(crate) const DEFAULT_CONCURRENCY: usize = 1;

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub(crate) struct FetchConfig {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
    /// Requests in flight at once.
    pub(crate) concurrency: usize,
    /// Ignore closes already in the cache.
    pub(crate) force_refresh: bool,
}

impl FetchConfig {
    /// Window of `years` ending at `end`.
    pub(crate) fn trailing(end: NaiveDate, years: f64) -> Self {
        Self {
            start: window_start(end, years),
            end,
            concurrency: DEFAULT_CONCURRENCY,
            force_refresh: false,
        }
    }
}

/// First day of a window of `years` ending at `end`.
pub(crate) fn window_start(end: NaiveDate, years: f64) -> NaiveDate {
    let days = (years.max(0.0) * 365.25).round() as u64;
    end.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// What a fetch run did.
#[derive(Debug, Default)]
pub(crate) struct FetchSummary {
    pub(crate) cached: usize,
    pub(crate) fetched: usize,
    pub(crate) failed: Vec<(Ticker, DataError)>,
}

/// Make sure the cache holds closes for every ticker over the window.
///
/// Failed tickers are logged and reported in the summary; only cache errors
/// abort the run.
pub(crate) async fn fetch_universe(
    client: &TwelveDataClient,
    cache: &SqliteCache,
    tickers: &[Ticker],
    config: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> Result<FetchSummary, DataError> {
    let mut summary = FetchSummary::default();
    let mut to_fetch = Vec::new();

    for ticker in tickers {
        if !config.force_refresh && cache.has_series(ticker.as_str(), config.start, config.end)? {
            summary.cached += 1;
        } else {
            to_fetch.push(ticker.clone());
        }
    }

    if let Some(pb) = progress {
        pb.set_length(tickers.len() as u64);
        pb.set_position(summary.cached as u64);
        if to_fetch.is_empty() {
            pb.set_message("All closes cached");
        } else {
            pb.set_message(format!(
                "Fetching {} tickers ({} concurrent)...",
                to_fetch.len(),
                config.concurrency
            ));
        }
    }

    let results: Vec<_> = stream::iter(to_fetch)
        .map(|ticker| async move {
            let result = client.fetch_series(&ticker, config.start, config.end).await;
            (ticker, result)
        })
        .buffer_unordered(config.concurrency.max(1))
        .inspect(|_| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await;

    for (ticker, result) in results {
        match result {
            Ok(series) => {
                cache.put_series(&ticker, &series)?;
                summary.fetched += 1;
            }
            Err(error) => {
                tracing::warn!(%ticker, %error, "failed to fetch closes");
                summary.failed.push((ticker, error));
            }
        }
    }
    summary.failed.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::info!(
        cached = summary.cached,
        fetched = summary.fetched,
        failed = summary.failed.len(),
        "price fetch finished"
    );
    Ok(summary)
}

/// Counts of records copied by [`import_files`].
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportSummary {
    pub(crate) series: usize,
    pub(crate) esg: usize,
    pub(crate) securities: usize,
}

/// Copy the legacy JSON files into the cache.
pub(crate) fn import_files(
    cache: &SqliteCache,
    prices: Option<&Path>,
    esg: Option<&Path>,
    securities: Option<&Path>,
) -> Result<ImportSummary, DataError> {
    let mut summary = ImportSummary::default();

    if let Some(path) = prices {
        let history = PriceHistory::from_json_file(path)?;
        for (ticker, series) in &history {
            cache.put_series(ticker, series)?;
        }
        summary.series = history.len();
    }

    if let Some(path) = esg {
        let scores = EsgScores::from_json_file(path)?;
        for (ticker, entry) in scores.iter() {
            cache.put_esg(ticker, entry)?;
        }
        summary.esg = scores.len();
    }

    if let Some(path) = securities {
        let directory = SecurityDirectory::from_json_file(path)?;
        for (ticker, info) in directory.iter() {
            cache.put_security(ticker, info)?;
        }
        summary.securities = directory.len();
    }

    tracing::info!(
        series = summary.series,
        esg = summary.esg,
        securities = summary.securities,
        "imported JSON files"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    #[test]
    fn test_window_start() {
        assert_eq!(window_start(day(2023, 3, 1), 1.0), day(2022, 3, 1));
        assert_eq!(window_start(day(2024, 3, 1), 0.0), day(2024, 3, 1));
    }

    #[tokio::test]
    async fn test_fetch_skips_cached_and_reports_failures() {
        let mut server = mockito::Server::new_async().await;
        let body = "datetime;open;high;low;close;volume\n\
                    2024-01-03;1;1;1;101.5;10\n\
                    2024-01-02;1;1;1;100.0;10\n";
        let ok = server
            .mock("GET", "/time_series")
            .match_query(mockito::Matcher::UrlEncoded("symbol".into(), "AAPL".into()))
            .with_status(200)
            .with_body(body)
            .expect(1)
            .create_async()
            .await;
        let failing = server
            .mock("GET", "/time_series")
            .match_query(mockito::Matcher::UrlEncoded("symbol".into(), "NOPE".into()))
            .with_status(200)
            .with_body(r#"{"code":404,"message":"symbol not found","status":"error"}"#)
            .create_async()
            .await;

        let client = TwelveDataClient::new("test-key")
            .with_base_url(server.url())
            .with_rate_limit(Duration::ZERO);
        let cache = SqliteCache::in_memory().unwrap();
        let config = FetchConfig {
            start: day(2024, 1, 2),
            end: day(2024, 1, 3),
            concurrency: 2,
            force_refresh: false,
        };

        let summary = fetch_universe(&client, &cache, &[t("AAPL"), t("NOPE")], &config, None)
            .await
            .unwrap();
        assert_eq!(summary.fetched, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, t("NOPE"));

        let series = cache.get_series("AAPL", config.start, config.end).unwrap();
        assert_eq!(series.len(), 2);

        let again = fetch_universe(&client, &cache, &[t("AAPL")], &config, None)
            .await
            .unwrap();
        assert_eq!(again.cached, 1);
        assert_eq!(again.fetched, 0);

        ok.assert_async().await;
        failing.assert_async().await;
    }

    #[test]
    fn test_import_files() {
        let dir = tempfile::tempdir().unwrap();
        let prices = dir.path().join("stock_prices.json");
        let esg = dir.path().join("ESG_Scores.json");
        let details = dir.path().join("stocks_details.json");
        std::fs::write(
            &prices,
            r#"{"AAPL": {"2024-01-02": "100.0", "2024-01-03": "101.5"}}"#,
        )
        .unwrap();
        std::fs::write(
            &esg,
            r#"{
                "AAPL": {"totalEsg": 17.2, "environmentScore": 0.6, "socialScore": 7.4, "governanceScore": 9.2},
                "XYZ": "No ESG data available"
            }"#,
        )
        .unwrap();
        std::fs::write(
            &details,
            r#"{"AAPL": {"company_name": "Apple Inc.", "market_cap": "$3.41T", "stock_price": "226.84"}}"#,
        )
        .unwrap();

        let cache = SqliteCache::in_memory().unwrap();
        let summary =
            import_files(&cache, Some(&prices), Some(&esg), Some(&details)).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                series: 1,
                esg: 2,
                securities: 1
            }
        );

        let scores = cache.esg_scores().unwrap();
        assert_eq!(scores.total("AAPL"), Some(17.2));
        assert_eq!(scores.total("XYZ"), None);
        assert_eq!(
            cache.securities().unwrap().display_name("AAPL"),
            "Apple Inc."
        );
    }
}
