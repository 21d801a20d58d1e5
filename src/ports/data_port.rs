//! Market data port trait.

use crate::domain::error::ScalperError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` in ascending time order, restricted to the inclusive
    /// date range when bounds are given.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, ScalperError>;

    fn list_symbols(&self) -> Result<Vec<String>, ScalperError>;
}
