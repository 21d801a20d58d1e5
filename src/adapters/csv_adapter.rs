//! CSV file data adapter.
//!
//! Reads `{symbol}.csv` from a base directory. Columns are located by header
//! name (case-insensitive), so extra columns such as `Adj Close` are ignored.

use crate::domain::error::ScalperError;
use crate::domain::ohlcv::{self, Bar};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const TIMESTAMP_COLUMNS: [&str; 4] = ["date", "datetime", "timestamp", "time"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn load_error(reason: impl Into<String>) -> ScalperError {
    ScalperError::DataLoad {
        reason: reason.into(),
    }
}

fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, ScalperError> {
    let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let find = |wanted: &str| {
        names
            .iter()
            .position(|n| n == wanted)
            .ok_or_else(|| load_error(format!("missing {} column", wanted)))
    };
    let timestamp = names
        .iter()
        .position(|n| TIMESTAMP_COLUMNS.contains(&n.as_str()))
        .ok_or_else(|| load_error("missing date column"))?;

    Ok(Columns {
        timestamp,
        open: find("open")?,
        high: find("high")?,
        low: find("low")?,
        close: find("close")?,
        volume: find("volume")?,
    })
}

/// Accepts a plain date (midnight) or one of the common datetime layouts.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn parse_price(record: &csv::StringRecord, index: usize, name: &str, row: usize) -> Result<f64, ScalperError> {
    record
        .get(index)
        .ok_or_else(|| load_error(format!("row {}: missing {} value", row, name)))?
        .trim()
        .parse()
        .map_err(|e| load_error(format!("row {}: invalid {} value: {}", row, name, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, ScalperError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| load_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| load_error(format!("CSV header error: {}", e)))?
            .clone();
        let cols = locate_columns(&headers)?;
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| load_error(format!("CSV parse error: {}", e)))?;

            let raw = record
                .get(cols.timestamp)
                .ok_or_else(|| load_error(format!("row {}: missing date value", row)))?;
            let timestamp = parse_timestamp(raw)
                .ok_or_else(|| load_error(format!("row {}: invalid date format: {}", row, raw)))?;

            bars.push(Bar {
                timestamp,
                open: parse_price(&record, cols.open, "open", row)?,
                high: parse_price(&record, cols.high, "high", row)?,
                low: parse_price(&record, cols.low, "low", row)?,
                close: parse_price(&record, cols.close, "close", row)?,
                volume: parse_price(&record, cols.volume, "volume", row)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        ohlcv::validate_bars(&bars)?;
        let bars = ohlcv::slice_by_date(&bars, start_date, end_date)?;
        debug!(symbol, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScalperError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            load_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| load_error(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
