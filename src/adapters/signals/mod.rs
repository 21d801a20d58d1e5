//! Built-in indicator signal sources.
//!
//! Each source reads its parameters from a [`StrategyConfig`]. Entries are
//! crossing events: a flag is set on the bar where the condition first
//! becomes true, never while it stays true. Exits are crossings too, except
//! for the EMA+RSI momentum filter.

pub mod bollinger;
pub mod ema_rsi;
pub mod rsi_threshold;
pub mod sma_crossover;

pub use bollinger::BollingerReversion;
pub use ema_rsi::EmaRsi;
pub use rsi_threshold::RsiThreshold;
pub use sma_crossover::SmaCrossover;

use crate::domain::strategy::StrategyConfig;
use crate::ports::signal_port::SignalPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Sma,
    Rsi,
    Bollinger,
    EmaRsi,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [
        SignalKind::Sma,
        SignalKind::Rsi,
        SignalKind::Bollinger,
        SignalKind::EmaRsi,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sma" | "sma_crossover" => Some(SignalKind::Sma),
            "rsi" | "rsi_threshold" => Some(SignalKind::Rsi),
            "bb" | "bollinger" => Some(SignalKind::Bollinger),
            "ema_rsi" | "ema-rsi" | "emarsi" => Some(SignalKind::EmaRsi),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SignalKind::Sma => sma_crossover::NAME,
            SignalKind::Rsi => rsi_threshold::NAME,
            SignalKind::Bollinger => bollinger::NAME,
            SignalKind::EmaRsi => ema_rsi::NAME,
        }
    }

    pub fn source(self) -> &'static dyn SignalPort {
        match self {
            SignalKind::Sma => &SmaCrossover,
            SignalKind::Rsi => &RsiThreshold,
            SignalKind::Bollinger => &BollingerReversion,
            SignalKind::EmaRsi => &EmaRsi,
        }
    }

    pub fn default_config(self) -> StrategyConfig {
        match self {
            SignalKind::Sma => sma_crossover::config(20, 50),
            SignalKind::Rsi => rsi_threshold::config(14, 30.0, 70.0),
            SignalKind::Bollinger => bollinger::config(20, 2.0),
            SignalKind::EmaRsi => ema_rsi::config(10, 30, 14, 50.0, 40.0),
        }
    }

    pub fn predefined_configurations(self) -> Vec<StrategyConfig> {
        match self {
            SignalKind::Sma => sma_crossover::predefined_configurations(),
            SignalKind::Rsi => rsi_threshold::predefined_configurations(),
            SignalKind::Bollinger => bollinger::predefined_configurations(),
            SignalKind::EmaRsi => ema_rsi::predefined_configurations(),
        }
    }
}

/// `a` moved from at-or-below `b` to strictly above it.
pub(crate) fn crossed_above(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    a > b && prev_a <= prev_b
}

/// `a` moved from at-or-above `b` to strictly below it.
pub(crate) fn crossed_below(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    a < b && prev_a >= prev_b
}
