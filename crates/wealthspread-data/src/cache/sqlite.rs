//! SQLite caching layer for market data.

use crate::error::{DataError, Result};
use crate::esg::{EsgEntry, EsgScore, EsgScores};
use crate::prices::{PriceHistory, PricePoint, PriceSeries, parse_date};
use crate::securities::{SecurityDirectory, SecurityInfo};
use crate::ticker::Ticker;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// Share of calendar days expected to be trading days when judging whether a
/// cached range is complete.
const TRADING_DAY_RATIO: f64 = 0.65;

/// SQLite cache for closes, ESG scores and security metadata.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS closes (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_closes_symbol_date ON closes(symbol, date)",
            [],
        )?;

        // available = 0 records a lookup that returned no data
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS esg_scores (
                symbol TEXT PRIMARY KEY,
                available INTEGER NOT NULL,
                total REAL,
                environmental REAL,
                social REAL,
                governance REAL,
                cached_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS securities (
                symbol TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                sector TEXT,
                market_cap TEXT,
                stock_price TEXT,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Check if closes are cached for most trading days of a date range.
    pub fn has_series(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM closes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3",
            params![symbol, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;

        let days = (end - start).num_days();
        let expected_count = (days as f64 * TRADING_DAY_RATIO) as i64;

        Ok(count > 0 && count >= expected_count)
    }

    /// Get cached closes for a symbol and date range.
    pub fn get_series(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let mut stmt = self.conn.prepare(
            "SELECT date, close
             FROM closes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;

        let rows = stmt.query_map(params![symbol, start.to_string(), end.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut points = Vec::new();
        for row in rows {
            let (date, close) = row?;
            points.push(PricePoint::new(parse_date(&date)?, close));
        }

        if points.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No cached data found".to_string(),
            });
        }

        Ok(PriceSeries::new(points))
    }

    /// Store closes in the cache.
    pub fn put_series(&self, ticker: &Ticker, series: &PriceSeries) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        for point in series.points() {
            tx.execute(
                "INSERT OR REPLACE INTO closes (symbol, date, close, cached_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![ticker.as_str(), point.date.to_string(), point.close, cached_at],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// All symbols with cached closes, in lexicographic order.
    pub fn symbols(&self) -> Result<Vec<Ticker>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT symbol FROM closes ORDER BY symbol")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(Ticker::new(row?)?);
        }
        Ok(tickers)
    }

    /// Load every cached series restricted to a date range.
    ///
    /// Symbols without closes in the range are left out.
    pub fn price_history(&self, start: NaiveDate, end: NaiveDate) -> Result<PriceHistory> {
        let mut history = PriceHistory::new();
        for ticker in self.symbols()? {
            match self.get_series(ticker.as_str(), start, end) {
                Ok(series) => {
                    history.insert(ticker, series);
                }
                Err(DataError::MissingData { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(history)
    }

    /// Store the ESG entry for a ticker.
    pub fn put_esg(&self, ticker: &Ticker, entry: &EsgEntry) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();
        let score = entry.score();

        self.conn.execute(
            "INSERT OR REPLACE INTO esg_scores
             (symbol, available, total, environmental, social, governance, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                ticker.as_str(),
                entry.is_available(),
                score.map(|s| s.total),
                score.map(|s| s.environmental),
                score.map(|s| s.social),
                score.map(|s| s.governance),
                cached_at
            ],
        )?;

        Ok(())
    }

    /// Get the ESG entry for a ticker, if one was cached.
    pub fn get_esg(&self, symbol: &str) -> Result<Option<EsgEntry>> {
        let row = self
            .conn
            .query_row(
                "SELECT available, total, environmental, social, governance
                 FROM esg_scores WHERE symbol = ?1",
                params![symbol],
                esg_from_row,
            )
            .optional()?;

        Ok(row)
    }

    /// Load every cached ESG entry.
    pub fn esg_scores(&self) -> Result<EsgScores> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, available, total, environmental, social, governance
             FROM esg_scores ORDER BY symbol",
        )?;
        let rows = stmt.query_map([], |row| {
            let symbol: String = row.get(0)?;
            let entry = esg_from_offset(row, 1)?;
            Ok((symbol, entry))
        })?;

        let mut scores = EsgScores::new();
        for row in rows {
            let (symbol, entry) = row?;
            scores.insert(Ticker::new(symbol)?, entry);
        }
        Ok(scores)
    }

    /// Store display metadata for a ticker.
    pub fn put_security(&self, ticker: &Ticker, info: &SecurityInfo) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO securities
             (symbol, company_name, sector, market_cap, stock_price, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ticker.as_str(),
                info.company_name,
                info.sector,
                info.market_cap,
                info.current_price,
                updated_at
            ],
        )?;

        Ok(())
    }

    /// Load all cached security metadata.
    pub fn securities(&self) -> Result<SecurityDirectory> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, company_name, sector, market_cap, stock_price
             FROM securities ORDER BY symbol",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                SecurityInfo {
                    company_name: row.get(1)?,
                    sector: row.get(2)?,
                    market_cap: row.get(3)?,
                    current_price: row.get(4)?,
                },
            ))
        })?;

        let mut directory = SecurityDirectory::new();
        for row in rows {
            let (symbol, info) = row?;
            directory.insert(Ticker::new(symbol)?, info);
        }
        Ok(directory)
    }

    /// Clear all cached data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM closes", [])?;
        self.conn.execute("DELETE FROM esg_scores", [])?;
        self.conn.execute("DELETE FROM securities", [])?;
        Ok(())
    }

    /// Clear cached data for a specific symbol.
    pub fn clear_symbol(&self, symbol: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM closes WHERE symbol = ?1", params![symbol])?;
        self.conn
            .execute("DELETE FROM esg_scores WHERE symbol = ?1", params![symbol])?;
        self.conn
            .execute("DELETE FROM securities WHERE symbol = ?1", params![symbol])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let closes_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM closes", [], |row| row.get(0))?;

        let symbols_count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT symbol) FROM closes", [], |row| {
                    row.get(0)
                })?;

        let esg_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM esg_scores WHERE available = 1",
            [],
            |row| row.get(0),
        )?;

        let securities_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM securities", [], |row| row.get(0))?;

        Ok(CacheStats {
            total_closes: closes_count as usize,
            unique_symbols: symbols_count as usize,
            esg_scores: esg_count as usize,
            securities: securities_count as usize,
        })
    }
}

fn esg_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EsgEntry> {
    esg_from_offset(row, 0)
}

fn esg_from_offset(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<EsgEntry> {
    let available: bool = row.get(offset)?;
    if !available {
        return Ok(EsgEntry::Unavailable);
    }

    let total: Option<f64> = row.get(offset + 1)?;
    let environmental: Option<f64> = row.get(offset + 2)?;
    let social: Option<f64> = row.get(offset + 3)?;
    let governance: Option<f64> = row.get(offset + 4)?;

    Ok(match (total, environmental, social, governance) {
        (Some(t), Some(e), Some(s), Some(g)) => EsgEntry::Available(EsgScore::new(t, e, s, g)),
        _ => EsgEntry::Unavailable,
    })
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Total number of cached closes
    pub total_closes: usize,
    /// Number of symbols with closes
    pub unique_symbols: usize,
    /// Number of available ESG scores
    pub esg_scores: usize,
    /// Number of securities with metadata
    pub securities: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn sample_series() -> PriceSeries {
        (1..=20)
            .map(|d| PricePoint::new(day(d), 100.0 + d as f64))
            .collect()
    }

    #[test]
    fn test_cache_initialization() {
        let cache = SqliteCache::in_memory();
        assert!(cache.is_ok());
    }

    #[test]
    fn test_series_roundtrip() {
        let cache = SqliteCache::in_memory().unwrap();
        let series = sample_series();
        cache.put_series(&ticker("AAPL"), &series).unwrap();

        let loaded = cache.get_series("AAPL", day(1), day(31)).unwrap();
        assert_eq!(loaded, series);

        let window = cache.get_series("AAPL", day(5), day(9)).unwrap();
        assert_eq!(window.len(), 5);

        assert!(matches!(
            cache.get_series("MSFT", day(1), day(31)),
            Err(DataError::MissingData { .. })
        ));
    }

    #[test]
    fn test_has_series() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_series(&ticker("AAPL"), &sample_series()).unwrap();

        assert!(cache.has_series("AAPL", day(1), day(20)).unwrap());
        let end_of_feb = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert!(!cache.has_series("AAPL", day(1), end_of_feb).unwrap());
        assert!(!cache.has_series("MSFT", day(1), day(20)).unwrap());
    }

    #[test]
    fn test_price_history() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_series(&ticker("MSFT"), &sample_series()).unwrap();
        cache.put_series(&ticker("AAPL"), &sample_series()).unwrap();

        let history = cache.price_history(day(1), day(31)).unwrap();
        let tickers: Vec<&str> = history.tickers().map(Ticker::as_str).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_esg_operations() {
        let cache = SqliteCache::in_memory().unwrap();
        let score = EsgEntry::Available(EsgScore::new(20.0, 5.0, 8.0, 7.0));

        cache.put_esg(&ticker("AAPL"), &score).unwrap();
        cache.put_esg(&ticker("XYZ"), &EsgEntry::Unavailable).unwrap();

        assert_eq!(cache.get_esg("AAPL").unwrap(), Some(score));
        assert_eq!(cache.get_esg("XYZ").unwrap(), Some(EsgEntry::Unavailable));
        assert_eq!(cache.get_esg("NONE").unwrap(), None);

        let all = cache.esg_scores().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.total("AAPL"), Some(20.0));
    }

    #[test]
    fn test_security_operations() {
        let cache = SqliteCache::in_memory().unwrap();
        let info = SecurityInfo {
            company_name: "Apple Inc.".to_string(),
            sector: Some("Technology".to_string()),
            market_cap: Some("$3.4T".to_string()),
            current_price: None,
        };
        cache.put_security(&ticker("AAPL"), &info).unwrap();

        let directory = cache.securities().unwrap();
        assert_eq!(directory.get("AAPL"), Some(&info));
    }

    #[test]
    fn test_clear_and_stats() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_series(&ticker("AAPL"), &sample_series()).unwrap();
        cache
            .put_esg(&ticker("AAPL"), &EsgEntry::Available(EsgScore::new(1.0, 0.5, 0.25, 0.25)))
            .unwrap();

        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.total_closes, 20);
        assert_eq!(stats.unique_symbols, 1);
        assert_eq!(stats.esg_scores, 1);

        cache.clear_symbol("AAPL").unwrap();
        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.total_closes, 0);
        assert_eq!(stats.esg_scores, 0);
    }
}
