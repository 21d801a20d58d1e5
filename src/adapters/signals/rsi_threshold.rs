//! RSI threshold reversion: enter when RSI drops below `oversold`, exit when
//! it rises above `overbought`.
//!
//! RSI uses Wilder's smoothing. The first average is the simple mean of the
//! first `period` changes; later ones are `(prev * (n - 1) + current) / n`.
//! The first `period` bars have no value.

use super::{crossed_above, crossed_below};
use crate::domain::error::ScalperError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::SignalSet;
use crate::domain::strategy::StrategyConfig;
use crate::ports::signal_port::SignalPort;

pub const NAME: &str = "rsi";

#[derive(Debug, Clone, Copy, Default)]
pub struct RsiThreshold;

pub fn config(period: usize, oversold: f64, overbought: f64) -> StrategyConfig {
    StrategyConfig::new(NAME)
        .with_param("period", period as f64)
        .with_param("oversold", oversold)
        .with_param("overbought", overbought)
}

pub fn predefined_configurations() -> Vec<StrategyConfig> {
    [
        (7, 30.0, 70.0),
        (14, 30.0, 70.0),
        (21, 30.0, 70.0),
        (14, 35.0, 65.0),
        (14, 40.0, 60.0),
        (14, 25.0, 75.0),
        (14, 20.0, 80.0),
        (9, 25.0, 75.0),
        (28, 35.0, 65.0),
    ]
    .into_iter()
    .map(|(period, oversold, overbought)| config(period, oversold, overbought))
    .collect()
}

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);

    let n = period as f64;
    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / n;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / n;
    out[period] = Some(rsi_from(avg_gain, avg_loss));

    for i in period + 1..closes.len() {
        let change = changes[i - 1];
        avg_gain = (avg_gain * (n - 1.0) + gain(change)) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss(change)) / n;
        out[i] = Some(rsi_from(avg_gain, avg_loss));
    }
    out
}

impl SignalPort for RsiThreshold {
    fn generate_signals(
        &self,
        bars: &[Bar],
        config: &StrategyConfig,
    ) -> Result<SignalSet, ScalperError> {
        let period = config.require_period("period")?;
        let oversold = config.require("oversold")?;
        let overbought = config.require("overbought")?;
        if period < 2 {
            return Err(ScalperError::SignalGeneration {
                reason: format!("{}: period must be at least 2", config.name),
            });
        }
        if !(0.0 < oversold && oversold < overbought && overbought < 100.0) {
            return Err(ScalperError::SignalGeneration {
                reason: format!(
                    "{}: thresholds must satisfy 0 < oversold < overbought < 100",
                    config.name
                ),
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let rsi = calculate_rsi(&closes, period);

        let mut enter = vec![false; bars.len()];
        let mut exit = vec![false; bars.len()];
        for i in 1..bars.len() {
            if let (Some(prev), Some(cur)) = (rsi[i - 1], rsi[i]) {
                enter[i] = crossed_below(prev, oversold, cur, oversold);
                exit[i] = crossed_above(prev, overbought, cur, overbought);
            }
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
    fn rsi_warmup_and_extremes() {
        let rising: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let rsi = calculate_rsi(&rising, 3);
        assert!(rsi[..3].iter().all(Option::is_none));
        assert_eq!(rsi[3], Some(100.0));

        let falling: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        let rsi = calculate_rsi(&falling, 3);
        assert_abs_diff_eq!(rsi[9].unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rsi_wilder_smoothing() {
        // changes: +2, -1, +1, -2
        let closes = [10.0, 12.0, 11.0, 12.0, 10.0];
        let rsi = calculate_rsi(&closes, 3);
        // first: gain 1.0, loss 1/3
        assert_abs_diff_eq!(rsi[3].unwrap(), 75.0, epsilon = 1e-9);
        // next: gain 2/3, loss (2/3 + 2)/3 = 8/9
        let expected = 100.0 - 100.0 / (1.0 + (2.0 / 3.0) / (8.0 / 9.0));
        assert_abs_diff_eq!(rsi[4].unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn too_few_bars_yields_no_values() {
        assert!(calculate_rsi(&[1.0, 2.0], 3).iter().all(Option::is_none));
    }

    #[test]
    fn drop_then_rally_enters_then_exits() {
        let mut closes = vec![100.0, 101.0, 100.5, 101.5, 101.0];
        closes.extend([95.0, 90.0, 85.0]);
        closes.extend([92.0, 99.0, 106.0, 113.0]);
        let bars = make_bars(&closes);
        let signals = RsiThreshold.generate_signals(&bars, &config(3, 30.0, 70.0)).unwrap();

        assert_eq!(signals.entry_count(), 1);
        assert_eq!(signals.exit_count(), 1);
        let enter_at = signals.enter.iter().position(|&f| f).unwrap();
        let exit_at = signals.exit.iter().position(|&f| f).unwrap();
        assert!(enter_at < exit_at);
    }

    #[test]
    fn thresholds_are_validated() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert!(RsiThreshold.generate_signals(&bars, &config(14, 70.0, 30.0)).is_err());
        assert!(RsiThreshold.generate_signals(&bars, &config(1, 30.0, 70.0)).is_err());
        assert!(RsiThreshold.generate_signals(&bars, &config(14, 30.0, 100.0)).is_err());
    }
}
