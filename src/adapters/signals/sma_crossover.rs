//! Moving-average crossover: enter when the short SMA crosses above the long
//! SMA, exit when it crosses back below.

use super::{crossed_above, crossed_below};
use crate::domain::error::ScalperError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::SignalSet;
use crate::domain::stats::rolling_mean;
use crate::domain::strategy::StrategyConfig;
use crate::ports::signal_port::SignalPort;

pub const NAME: &str = "sma";

#[derive(Debug, Clone, Copy, Default)]
pub struct SmaCrossover;

pub fn config(short_window: usize, long_window: usize) -> StrategyConfig {
    StrategyConfig::new(NAME)
        .with_param("short_window", short_window as f64)
        .with_param("long_window", long_window as f64)
}

pub fn predefined_configurations() -> Vec<StrategyConfig> {
    [
        (5, 15),
        (10, 30),
        (20, 50),
        (12, 26),
        (30, 70),
        (50, 100),
        (50, 200),
        (15, 45),
        (25, 75),
    ]
    .into_iter()
    .map(|(short, long)| config(short, long))
    .collect()
}

impl SignalPort for SmaCrossover {
    fn generate_signals(
        &self,
        bars: &[Bar],
        config: &StrategyConfig,
    ) -> Result<SignalSet, ScalperError> {
        let short = config.require_period("short_window")?;
        let long = config.require_period("long_window")?;
        if short >= long {
            return Err(ScalperError::SignalGeneration {
                reason: format!(
                    "{}: short_window ({}) must be less than long_window ({})",
                    config.name, short, long
                ),
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = rolling_mean(&closes, short);
        let slow = rolling_mean(&closes, long);

        let mut enter = vec![false; bars.len()];
        let mut exit = vec![false; bars.len()];
        for i in 1..bars.len() {
            if let (Some(pf), Some(ps), Some(f), Some(s)) = (fast[i - 1], slow[i - 1], fast[i], slow[i]) {
                enter[i] = crossed_above(pf, ps, f, s);
                exit[i] = crossed_below(pf, ps, f, s);
            }
        }

        Ok(SignalSet::from_flags(bars, enter, exit))
    }
}
