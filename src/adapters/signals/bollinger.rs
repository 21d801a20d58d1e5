//! Bollinger band reversion: enter when the close crosses below the lower
//! band, exit when it crosses above the upper band.

use super::{crossed_above, crossed_below};
use crate::domain::error::ScalperError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::SignalSet;
use crate::domain::stats::{rolling_mean, rolling_std};
use crate::domain::strategy::StrategyConfig;
use crate::ports::signal_port::SignalPort;

pub const NAME: &str = "bollinger";

#[derive(Debug, Clone, Copy, Default)]
pub struct BollingerReversion;

pub fn config(period: usize, std_dev: f64) -> StrategyConfig {
    StrategyConfig::new(NAME)
        .with_param("period", period as f64)
        .with_param("std_dev", std_dev)
}

pub fn predefined_configurations() -> Vec<StrategyConfig> {
    [
        (20, 2.0),
        (20, 1.5),
        (20, 2.5),
        (10, 2.0),
        (30, 2.0),
        (50, 2.0),
        (15, 1.8),
        (25, 2.2),
        (12, 2.5),
    ]
    .into_iter()
    .map(|(period, std_dev)| config(period, std_dev))
    .collect()
}

impl SignalPort for BollingerReversion {
    fn generate_signals(
        &self,
        bars: &[Bar],
        config: &StrategyConfig,
    ) -> Result<SignalSet, ScalperError> {
        let period = config.require_period("period")?;
        let width = config.require("std_dev")?;
        if period < 2 {
            return Err(ScalperError::SignalGeneration {
                reason: format!("{}: period must be at least 2", config.name),
            });
        }
        if !(width > 0.0 && width <= 5.0) {
            return Err(ScalperError::SignalGeneration {
                reason: format!("{}: std_dev must be in (0, 5], got {}", config.name, width),
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let middle = rolling_mean(&closes, period);
        let spread = rolling_std(&closes, period);
        let bands: Vec<Option<(f64, f64)>> = middle
            .iter()
            .zip(&spread)
            .map(|pair| match pair {
                (Some(m), Some(s)) => Some((m - width * s, m + width * s)),
                _ => None,
            })
            .collect();

        let mut enter = vec![false; bars.len()];
        let mut exit = vec![false; bars.len()];
        for i in 1..bars.len() {
            if let (Some((prev_lower, prev_upper)), Some((lower, upper))) = (bands[i - 1], bands[i]) {
                enter[i] = crossed_below(closes[i - 1], prev_lower, closes[i], lower);
                exit[i] = crossed_above(closes[i - 1], prev_upper, closes[i], upper);
            }
        }

        Ok(SignalSet::from_flags(bars, enter, exit))
    }
}
