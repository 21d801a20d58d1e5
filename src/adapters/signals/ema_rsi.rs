//! EMA crossover filtered by RSI momentum.
//!
//! Enter when the fast EMA crosses above the slow EMA while RSI is above
//! `rsi_entry`. Exit when the fast EMA crosses below the slow EMA, or on any
//! bar where RSI is below `rsi_exit`. The exit filter is a level, so it
//! repeats while momentum stays weak; the simulator ignores exits while flat.

use super::rsi_threshold::calculate_rsi;
use super::{crossed_above, crossed_below};
use crate::domain::error::ScalperError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::SignalSet;
use crate::domain::strategy::StrategyConfig;
use crate::ports::signal_port::SignalPort;

pub const NAME: &str = "ema_rsi";

/// Extra bars beyond the longest lookback before signals are trusted.
const WARMUP_BUFFER: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmaRsi;

pub fn config(
    ema_fast: usize,
    ema_slow: usize,
    rsi_period: usize,
    rsi_entry: f64,
    rsi_exit: f64,
) -> StrategyConfig {
    StrategyConfig::new(NAME)
        .with_param("ema_fast", ema_fast as f64)
        .with_param("ema_slow", ema_slow as f64)
        .with_param("rsi_period", rsi_period as f64)
        .with_param("rsi_entry", rsi_entry)
        .with_param("rsi_exit", rsi_exit)
}

/// A grid around the usual settings plus a few conservative and aggressive
/// hand-picked sets.
pub fn predefined_configurations() -> Vec<StrategyConfig> {
    let mut configs = Vec::new();
    for fast in [8, 10, 12] {
        for slow in [25, 30, 35] {
            for entry in [40.0, 42.0, 44.0] {
                for exit in [28.0, 30.0, 32.0] {
                    configs.push(config(fast, slow, 14, entry, exit));
                }
            }
        }
    }
    configs.extend([
        config(15, 45, 21, 55.0, 35.0),
        config(20, 50, 14, 52.0, 38.0),
        config(5, 15, 7, 45.0, 35.0),
        config(8, 21, 10, 48.0, 32.0),
    ]);
    configs
}

/// Exponential moving average with `k = 2 / (period + 1)`, seeded with the
/// first close so every bar has a value.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(closes.len());
    let mut ema = match closes.first() {
        Some(&first) => first,
        None => return out,
    };
    for &close in closes {
        ema = close * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

fn invalid(config: &StrategyConfig, reason: String) -> ScalperError {
    ScalperError::SignalGeneration {
        reason: format!("{}: {}", config.name, reason),
    }
}

impl SignalPort for EmaRsi {
    fn generate_signals(
        &self,
        bars: &[Bar],
        config: &StrategyConfig,
    ) -> Result<SignalSet, ScalperError> {
        let fast_period = config.require_period("ema_fast")?;
        let slow_period = config.require_period("ema_slow")?;
        let rsi_period = config.require_period("rsi_period")?;
        let rsi_entry = config.require("rsi_entry")?;
        let rsi_exit = config.require("rsi_exit")?;

        if fast_period >= slow_period {
            return Err(invalid(
                config,
                format!("ema_fast ({fast_period}) must be less than ema_slow ({slow_period})"),
            ));
        }
        if rsi_period < 2 {
            return Err(invalid(config, "rsi_period must be at least 2".to_string()));
        }
        if !(0.0 < rsi_exit && rsi_exit < rsi_entry && rsi_entry < 100.0) {
            return Err(invalid(
                config,
                "thresholds must satisfy 0 < rsi_exit < rsi_entry < 100".to_string(),
            ));
        }
        let required = slow_period.max(rsi_period) + WARMUP_BUFFER;
        if bars.len() < required {
            return Err(invalid(
                config,
                format!("needs at least {required} bars, got {}", bars.len()),
            ));
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = calculate_ema(&closes, fast_period);
        let slow = calculate_ema(&closes, slow_period);
        let rsi = calculate_rsi(&closes, rsi_period);

        let mut enter = vec![false; bars.len()];
        let mut exit = vec![false; bars.len()];
        for i in 1..bars.len() {
            let bullish = crossed_above(fast[i - 1], slow[i - 1], fast[i], slow[i]);
            let bearish = crossed_below(fast[i - 1], slow[i - 1], fast[i], slow[i]);
            enter[i] = bullish && rsi[i].is_some_and(|r| r > rsi_entry);
            exit[i] = bearish || rsi[i].is_some_and(|r| r < rsi_exit);
        }

        Ok(SignalSet::from_flags(bars, enter, exit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn ema_seeds_with_first_close() {
        let ema = calculate_ema(&[10.0, 20.0, 30.0], 3);
        // k = 0.5
        assert_abs_diff_eq!(ema[0], 10.0);
        assert_abs_diff_eq!(ema[1], 15.0);
        assert_abs_diff_eq!(ema[2], 22.5);
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn bullish_cross_with_strong_rsi_enters() {
        // steady decline, a sharp rally, then a collapse
        let closes = [
            100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 94.0, 100.0, 106.0, 112.0, 104.0, 96.0, 88.0,
            80.0, 72.0,
        ];
        let bars = make_bars(&closes);
        let signals = EmaRsi
            .generate_signals(&bars, &config(2, 5, 3, 50.0, 40.0))
            .unwrap();

        let entries: Vec<usize> = (0..bars.len()).filter(|&i| signals.enter[i]).collect();
        assert_eq!(entries, vec![7]);
        assert!(signals.exit.iter().skip(8).any(|&f| f));
    }

    #[test]
    fn weak_rsi_exits_on_every_bar() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 - i as f64).collect();
        let bars = make_bars(&closes);
        let signals = EmaRsi
            .generate_signals(&bars, &config(2, 5, 3, 50.0, 40.0))
            .unwrap();

        assert_eq!(signals.entry_count(), 0);
        // RSI is defined from bar 3 and pinned at 0
        assert!(signals.exit[3..].iter().all(|&f| f));
    }

    #[test]
    fn parameters_are_validated() {
        let bars = make_bars(&[100.0; 60]);
        assert!(EmaRsi.generate_signals(&bars, &config(30, 10, 14, 50.0, 40.0)).is_err());
        assert!(EmaRsi.generate_signals(&bars, &config(10, 30, 14, 40.0, 50.0)).is_err());
        assert!(EmaRsi.generate_signals(&bars, &config(10, 30, 1, 50.0, 40.0)).is_err());
        assert!(EmaRsi.generate_signals(&bars, &config(10, 30, 14, 50.0, 40.0)).is_ok());
    }

    #[test]
    fn short_history_is_rejected() {
        let bars = make_bars(&[100.0; 39]);
        let err = EmaRsi
            .generate_signals(&bars, &config(10, 30, 14, 50.0, 40.0))
            .unwrap_err();
        assert!(matches!(err, ScalperError::SignalGeneration { .. }));
    }

    #[test]
    fn predefined_grid_is_valid() {
        let configs = predefined_configurations();
        assert_eq!(configs.len(), 81 + 4);
        let bars = make_bars(&(0..80).map(|i| 100.0 + (i as f64 / 5.0).sin()).collect::<Vec<_>>());
        for cfg in &configs {
            assert!(EmaRsi.generate_signals(&bars, cfg).is_ok(), "{}", cfg.label());
        }
    }
}
