//! Open position state and closed round-trip trades.

use chrono::{Duration, NaiveDateTime};

/// A long position held by the simulator between an entry and an exit fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub entry_index: usize,
    /// Cash spent on entry, commission included.
    pub entry_cost: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }
}

/// Snapshot of the simulator's position slot, as seen from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionState {
    pub is_open: bool,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_time: Option<NaiveDateTime>,
}

impl PositionState {
    pub fn flat() -> Self {
        PositionState {
            is_open: false,
            quantity: 0.0,
            entry_price: 0.0,
            entry_time: None,
        }
    }
}

impl From<&Position> for PositionState {
    fn from(pos: &Position) -> Self {
        PositionState {
            is_open: true,
            quantity: pos.quantity,
            entry_price: pos.entry_price,
            entry_time: Some(pos.entry_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// Price move only: quantity * (exit_price - entry_price).
    pub gross_pnl: f64,
    /// Exit proceeds minus entry cost, commissions included.
    pub net_pnl: f64,
    pub return_pct: f64,
    pub holding_duration: Duration,
    pub holding_bars: usize,
    pub forced_close: bool,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.net_pnl < 0.0
    }
}
