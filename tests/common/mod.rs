#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use scalper::domain::error::ScalperError;
pub use scalper::domain::ohlcv::Bar;
use scalper::domain::signal::SignalSet;
use scalper::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, ScalperError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ScalperError::DataLoad {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).cloned().unwrap_or_default();
        Ok(bars
            .into_iter()
            .filter(|b| {
                let day = b.timestamp.date();
                start_date.is_none_or(|s| day >= s) && end_date.is_none_or(|e| day <= e)
            })
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScalperError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(offset)
}

pub fn make_bar(date: &str, close: f64) -> Bar {
    Bar {
        timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1000.0,
    }
}

/// One daily bar per close, starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: day(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Deterministic trending series with a sine wobble, long enough for SMA/RSI windows.
pub fn generate_bars(n: usize, start_price: f64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            start_price * (1.0 + 0.002 * t) + 5.0 * (t / 6.0).sin()
        })
        .collect();
    bars_from_closes(&closes)
}

pub fn flags(n: usize, on: &[usize]) -> Vec<bool> {
    (0..n).map(|i| on.contains(&i)).collect()
}

pub fn signals(bars: &[Bar], enter_on: &[usize], exit_on: &[usize]) -> SignalSet {
    SignalSet::from_flags(bars, flags(bars.len(), enter_on), flags(bars.len(), exit_on))
}

/// Writes `{symbol}.csv` in yfinance layout.
pub fn write_csv(dir: &std::path::Path, symbol: &str, bars: &[Bar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.timestamp.date(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}
