//! Signal source port.

use crate::domain::error::ScalperError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::SignalSet;
use crate::domain::strategy::StrategyConfig;

/// Produces entry/exit signals for `bars` under one parameter configuration.
///
/// Implementations must be pure: the same bars and configuration always give
/// the same signals, and nothing is shared between calls.
pub trait SignalPort: Sync {
    fn generate_signals(
        &self,
        bars: &[Bar],
        config: &StrategyConfig,
    ) -> Result<SignalSet, ScalperError>;
}

impl<F> SignalPort for F
where
    F: Fn(&[Bar], &StrategyConfig) -> Result<SignalSet, ScalperError> + Sync,
{
    fn generate_signals(
        &self,
        bars: &[Bar],
        config: &StrategyConfig,
    ) -> Result<SignalSet, ScalperError> {
        self(bars, config)
    }
}
