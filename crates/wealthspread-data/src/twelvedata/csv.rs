//! Parsing of `time_series` CSV responses.

use crate::error::{DataError, Result};
use crate::prices::{PricePoint, PriceSeries, parse_date};

/// Parse a `time_series` CSV body (`datetime;open;high;low;close;volume`).
///
/// Only the `datetime` and `close` columns are read. Rows may arrive
/// newest-first; the returned series is chronological.
pub fn parse_time_series_csv(body: &str) -> Result<PriceSeries> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(::csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DataError::Parse(format!("Missing {} column", name)))
    };
    let date_idx = column("datetime")?;
    let close_idx = column("close")?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        let date = record
            .get(date_idx)
            .ok_or_else(|| DataError::Parse("Missing datetime".to_string()))?;
        let close = record
            .get(close_idx)
            .ok_or_else(|| DataError::Parse("Missing close".to_string()))?;

        let close = close
            .parse::<f64>()
            .map_err(|e| DataError::Parse(format!("Invalid close {:?}: {}", close, e)))?;
        points.push(PricePoint::new(parse_date(date)?, close));
    }

    Ok(PriceSeries::new(points))
}
