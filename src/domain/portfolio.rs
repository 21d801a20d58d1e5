//! Single-asset account state and the equity curve it produces.

use chrono::NaiveDateTime;

use super::position::{Position, PositionState, Trade};

/// One mark-to-market observation per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    pub cash: f64,
    pub quantity: f64,
    pub in_position: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EquityCurve {
    pub points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    pub fn last_equity(&self) -> Option<f64> {
        self.points.last().map(|p| p.equity)
    }

    /// Fraction of bars spent holding a position.
    pub fn exposure(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let held = self.points.iter().filter(|p| p.in_position).count();
        held as f64 / self.points.len() as f64
    }
}

/// Mutable account used during one simulation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_cash: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: EquityCurve,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            cash: initial_cash,
            initial_cash,
            position: None,
            trades: Vec::new(),
            equity_curve: EquityCurve::default(),
        }
    }

    pub fn is_long(&self) -> bool {
        self.position.is_some()
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |pos| pos.market_value(price))
    }

    /// Push the mark-to-market point for a bar.
    pub fn record_equity(&mut self, timestamp: NaiveDateTime, price: f64) {
        let equity = self.total_equity(price);
        let quantity = self.position.as_ref().map_or(0.0, |p| p.quantity);
        self.equity_curve.points.push(EquityPoint {
            timestamp,
            equity,
            cash: self.cash,
            quantity,
            in_position: self.position.is_some(),
        });
    }

    pub fn position_state(&self) -> PositionState {
        self.position
            .as_ref()
            .map_or_else(PositionState::flat, PositionState::from)
    }
}
