//! OHLCV bar representation and series helpers.

use chrono::{NaiveDate, NaiveDateTime};

use super::error::ScalperError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Check that a bar series is usable: strictly ascending timestamps,
/// positive finite prices and non-negative volume.
pub fn validate_bars(bars: &[Bar]) -> Result<(), ScalperError> {
    for (index, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(ScalperError::InvalidBar {
                index,
                reason: "prices must be positive".to_string(),
            });
        }
        if !bar.volume.is_finite() || bar.volume < 0.0 {
            return Err(ScalperError::InvalidBar {
                index,
                reason: "volume must be non-negative".to_string(),
            });
        }
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(ScalperError::InvalidBar {
                index,
                reason: format!(
                    "timestamp {} is not after {}",
                    bar.timestamp,
                    bars[index - 1].timestamp
                ),
            });
        }
    }
    Ok(())
}

/// Inclusive date-range filter. Either bound may be open.
pub fn slice_by_date(
    bars: &[Bar],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<Bar>, ScalperError> {
    let sliced: Vec<Bar> = bars
        .iter()
        .filter(|b| {
            let day = b.timestamp.date();
            start.is_none_or(|s| day >= s) && end.is_none_or(|e| day <= e)
        })
        .cloned()
        .collect();

    if sliced.is_empty() {
        return Err(ScalperError::InsufficientData {
            bars: 0,
            minimum: 1,
        });
    }
    Ok(sliced)
}

/// close[-1] / close[0] - 1, or 0 for fewer than two bars.
pub fn buy_and_hold_return(bars: &[Bar]) -> f64 {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) if bars.len() >= 2 && first.close > 0.0 => {
            last.close / first.close - 1.0
        }
        _ => 0.0,
    }
}
