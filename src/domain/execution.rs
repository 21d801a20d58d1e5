//! Fill simulation: slippage, commission, all-in sizing and position exits.
//!
//! Fills happen at bar closes. Slippage always moves the fill price against
//! the trader; commission is a rate on traded notional, charged on both legs.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::error::ScalperError;
use super::portfolio::Portfolio;
use super::position::{Position, Trade};

/// How much of the available cash an entry converts into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sizing {
    /// Any fractional quantity; cash lands exactly at zero after the entry.
    #[default]
    Fractional,
    /// Whole units only; leftover cash stays idle.
    WholeUnits,
}

impl Sizing {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fractional" | "fraction" => Some(Sizing::Fractional),
            "whole" | "whole_units" | "integer" => Some(Sizing::WholeUnits),
            _ => None,
        }
    }
}

/// Immutable per-run simulation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub sizing: Sizing,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            initial_cash: 10_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.0001,
            sizing: Sizing::Fractional,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), ScalperError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(ScalperError::configuration(
                "initial_cash",
                format!("must be positive, got {}", self.initial_cash),
            ));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(ScalperError::configuration(
                "commission_rate",
                format!("must be in [0, 1), got {}", self.commission_rate),
            ));
        }
        if !(0.0..1.0).contains(&self.slippage_rate) {
            return Err(ScalperError::configuration(
                "slippage_rate",
                format!("must be in [0, 1), got {}", self.slippage_rate),
            ));
        }
        Ok(())
    }
}

/// Buy fill: close * (1 + slippage)
pub fn apply_slippage_entry(close: f64, slippage_rate: f64) -> f64 {
    close * (1.0 + slippage_rate)
}

/// Sell fill: close * (1 - slippage)
pub fn apply_slippage_exit(close: f64, slippage_rate: f64) -> f64 {
    close * (1.0 - slippage_rate)
}

/// Units purchasable with `cash` at `fill_price`, commission included.
pub fn entry_quantity(cash: f64, fill_price: f64, params: &SimulationParams) -> f64 {
    let raw = cash / (fill_price * (1.0 + params.commission_rate));
    match params.sizing {
        Sizing::Fractional => raw,
        Sizing::WholeUnits => raw.floor(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: f64,
        fill_price: f64,
        cost: f64,
    },
    InsufficientFunds,
}

/// Deploy all available cash into a long position at this bar's close.
pub fn enter_long(
    portfolio: &mut Portfolio,
    close: f64,
    timestamp: NaiveDateTime,
    index: usize,
    params: &SimulationParams,
) -> EntryResult {
    let fill_price = apply_slippage_entry(close, params.slippage_rate);
    let quantity = entry_quantity(portfolio.cash, fill_price, params);

    if !quantity.is_finite() || quantity <= 0.0 {
        warn!(
            %timestamp,
            cash = portfolio.cash,
            fill_price,
            "entry signal skipped: insufficient funds"
        );
        return EntryResult::InsufficientFunds;
    }

    let cost = quantity * fill_price * (1.0 + params.commission_rate);
    // Fractional sizing spends everything; keep rounding dust from going negative.
    portfolio.cash = (portfolio.cash - cost).max(0.0);
    portfolio.position = Some(Position {
        quantity,
        entry_price: fill_price,
        entry_time: timestamp,
        entry_index: index,
        entry_cost: cost,
    });

    debug!(%timestamp, quantity, fill_price, cost, "entered long");

    EntryResult::Entered {
        quantity,
        fill_price,
        cost,
    }
}

/// Close the open position at `close` with slippage and commission.
///
/// Returns `None` when the portfolio is flat.
pub fn exit_long<'a>(
    portfolio: &'a mut Portfolio,
    close: f64,
    timestamp: NaiveDateTime,
    index: usize,
    params: &SimulationParams,
) -> Option<&'a Trade> {
    let fill_price = apply_slippage_exit(close, params.slippage_rate);
    close_position(
        portfolio,
        fill_price,
        params.commission_rate,
        timestamp,
        index,
        false,
    )
}

/// Liquidate at the final close, free of slippage and commission.
pub fn force_close(
    portfolio: &mut Portfolio,
    close: f64,
    timestamp: NaiveDateTime,
    index: usize,
) -> Option<&Trade> {
    close_position(portfolio, close, 0.0, timestamp, index, true)
}

fn close_position(
    portfolio: &mut Portfolio,
    fill_price: f64,
    commission_rate: f64,
    timestamp: NaiveDateTime,
    index: usize,
    forced_close: bool,
) -> Option<&Trade> {
    let position = portfolio.position.take()?;

    let proceeds = position.quantity * fill_price * (1.0 - commission_rate);
    portfolio.cash += proceeds;

    let net_pnl = proceeds - position.entry_cost;
    let return_pct = if position.entry_cost > 0.0 {
        net_pnl / position.entry_cost
    } else {
        0.0
    };

    let trade = Trade {
        entry_time: position.entry_time,
        exit_time: timestamp,
        entry_price: position.entry_price,
        exit_price: fill_price,
        quantity: position.quantity,
        gross_pnl: position.quantity * (fill_price - position.entry_price),
        net_pnl,
        return_pct,
        holding_duration: timestamp - position.entry_time,
        holding_bars: index.saturating_sub(position.entry_index),
        forced_close,
    };

    debug!(
        %timestamp,
        fill_price,
        net_pnl,
        forced_close,
        "closed long"
    );

    portfolio.record_trade(trade);
    portfolio.trades.last()
}
