//! On-disk form of the refresh artifacts.
//!
//! The correlation matrix is a CSV table whose first row holds the tickers
//! (after an empty corner cell) and whose first column repeats them. Values
//! use the shortest representation that parses back to the same `f64`;
//! undefined correlations are empty cells. The return map is a JSON object
//! from ticker to return.

use crate::ExportError;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use wealthspread_data::Ticker;
use wealthspread_model::{CorrelationMatrix, ReturnMap};

/// Conventional file name of the correlation matrix.
pub const CORRELATION_FILE: &str = "correlation_matrix.csv";

/// Conventional file name of the return map.
pub const RETURN_MAP_FILE: &str = "scaled_geometric_mean.json";

/// Write `matrix` as CSV.
pub fn write_correlation_csv<W: Write>(
    matrix: &CorrelationMatrix,
    writer: W,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![String::new()];
    header.extend(matrix.tickers().iter().map(Ticker::to_string));
    wtr.write_record(&header)?;

    for (ticker, row) in matrix.tickers().iter().zip(matrix.values().rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(ticker.to_string());
        record.extend(row.iter().map(|&v| format_cell(v)));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Read a matrix written by [`write_correlation_csv`].
///
/// Cells reading `nan` in any case are accepted as undefined too.
pub fn read_correlation_csv<R: Read>(reader: R) -> Result<CorrelationMatrix, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let tickers = rdr
        .headers()?
        .iter()
        .skip(1)
        .map(Ticker::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ExportError::InvalidFormat(e.to_string()))?;
    let n = tickers.len();

    let mut values = Array2::<f64>::from_elem((n, n), f64::NAN);
    let mut rows = 0;
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let expected = tickers.get(i).ok_or_else(|| {
            ExportError::InvalidFormat(format!("more than {} rows in correlation matrix", n))
        })?;
        let label = record.get(0).unwrap_or_default();
        if label != expected.as_str() {
            return Err(ExportError::InvalidFormat(format!(
                "row {} is labelled {:?}, expected {}",
                i + 1,
                label,
                expected
            )));
        }
        if record.len() != n + 1 {
            return Err(ExportError::InvalidFormat(format!(
                "row {} has {} values, expected {}",
                expected,
                record.len().saturating_sub(1),
                n
            )));
        }
        for (j, cell) in record.iter().skip(1).enumerate() {
            values[[i, j]] = parse_cell(cell)?;
        }
        rows += 1;
    }

    if rows != n {
        return Err(ExportError::InvalidFormat(format!(
            "correlation matrix has {} rows for {} tickers",
            rows, n
        )));
    }

    Ok(CorrelationMatrix::from_parts(tickers, values)?)
}

/// Write `returns` as a JSON object.
///
/// # Errors
/// [`ExportError::InvalidFormat`] when a value is not finite, since JSON
/// cannot represent it.
pub fn write_return_map<W: Write>(returns: &ReturnMap, writer: W) -> Result<(), ExportError> {
    if let Some((ticker, value)) = returns.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ExportError::InvalidFormat(format!(
            "return of {} is not finite: {}",
            ticker, value
        )));
    }
    serde_json::to_writer_pretty(writer, returns)?;
    Ok(())
}

/// Read a return map written by [`write_return_map`].
pub fn read_return_map<R: Read>(reader: R) -> Result<ReturnMap, ExportError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Save `matrix` to `path`.
pub fn save_correlation_csv(matrix: &CorrelationMatrix, path: &Path) -> Result<(), ExportError> {
    write_correlation_csv(matrix, BufWriter::new(File::create(path)?))?;
    tracing::debug!(path = %path.display(), tickers = matrix.len(), "saved correlation matrix");
    Ok(())
}

/// Load a matrix from `path`.
pub fn load_correlation_csv(path: &Path) -> Result<CorrelationMatrix, ExportError> {
    read_correlation_csv(BufReader::new(File::open(path)?))
}

/// Save `returns` to `path`.
pub fn save_return_map(returns: &ReturnMap, path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_return_map(returns, &mut writer)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), tickers = returns.len(), "saved return map");
    Ok(())
}

/// Load a return map from `path`.
pub fn load_return_map(path: &Path) -> Result<ReturnMap, ExportError> {
    read_return_map(BufReader::new(File::open(path)?))
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_cell(cell: &str) -> Result<f64, ExportError> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|e| ExportError::InvalidFormat(format!("bad correlation {:?}: {}", cell, e)))
}
