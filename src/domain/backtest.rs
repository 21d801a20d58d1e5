//! Backtest engine: the bar-by-bar simulation loop.
//!
//! BacktestConfig bundles the simulation parameters with the reporting
//! settings a full run needs.

use tracing::{debug, info, warn};

use super::error::ScalperError;
use super::execution::{self, EntryResult, SimulationParams};
use super::metrics::{self, MetricsReport};
use super::ohlcv::Bar;
use super::portfolio::{EquityCurve, Portfolio};
use super::position::{PositionState, Trade};
use super::signal::SignalSet;

/// A simulation needs at least this many bars to produce one return.
pub const MIN_BARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub simulation: SimulationParams,
    /// Annualization factor, e.g. 365 for daily crypto bars.
    pub bars_per_year: u32,
    /// Run comparison configurations on the rayon pool.
    pub parallel: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            simulation: SimulationParams::default(),
            bars_per_year: 365,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub equity_curve: EquityCurve,
    pub trades: Vec<Trade>,
    pub final_cash: f64,
    pub final_position: PositionState,
    /// Entry signals that could not be filled for lack of cash.
    pub skipped_entries: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub simulation: SimulationResult,
    pub report: MetricsReport,
}

/// Simulate an all-in, long-only account driven by `signals`.
///
/// Exit is evaluated before entry on every bar, and a bar carrying an exit
/// flag never opens a position. Any position still open after the last bar
/// is closed at the last close without costs.
pub fn simulate(
    bars: &[Bar],
    signals: &SignalSet,
    params: &SimulationParams,
) -> Result<SimulationResult, ScalperError> {
    params.validate()?;
    if bars.len() < MIN_BARS {
        return Err(ScalperError::InsufficientData {
            bars: bars.len(),
            minimum: MIN_BARS,
        });
    }
    signals.check_alignment(bars)?;

    let conflicts = signals.conflict_count();
    if conflicts > 0 {
        debug!(conflicts, "bars with both enter and exit set; exit takes priority");
    }
    if signals.entry_count() == 0 && signals.exit_count() == 0 {
        warn!(bars = bars.len(), "no trading signals in series");
    }

    let mut portfolio = Portfolio::new(params.initial_cash);
    let mut skipped_entries = 0usize;

    for (i, bar) in bars.iter().enumerate() {
        let exit_flag = signals.exit[i];

        if exit_flag && portfolio.is_long() {
            execution::exit_long(&mut portfolio, bar.close, bar.timestamp, i, params);
        }

        if signals.enter[i] && !exit_flag && !portfolio.is_long() {
            let entry = execution::enter_long(&mut portfolio, bar.close, bar.timestamp, i, params);
            if entry == EntryResult::InsufficientFunds {
                skipped_entries += 1;
            }
        }

        portfolio.record_equity(bar.timestamp, bar.close);
    }

    if let Some(last) = bars.last() {
        execution::force_close(&mut portfolio, last.close, last.timestamp, bars.len() - 1);
    }

    debug_assert!(portfolio.position.is_none());

    info!(
        bars = bars.len(),
        trades = portfolio.trades.len(),
        final_cash = portfolio.cash,
        "simulation complete"
    );

    Ok(SimulationResult {
        final_position: portfolio.position_state(),
        final_cash: portfolio.cash,
        equity_curve: portfolio.equity_curve,
        trades: portfolio.trades,
        skipped_entries,
    })
}

/// Simulate, then analyze, then attach the buy-and-hold benchmark.
pub fn run_backtest(
    bars: &[Bar],
    signals: &SignalSet,
    config: &BacktestConfig,
) -> Result<BacktestResult, ScalperError> {
    let simulation = simulate(bars, signals, &config.simulation)?;
    let report = metrics::analyze(
        &simulation.equity_curve,
        &simulation.trades,
        config.simulation.initial_cash,
        config.bars_per_year,
    )?
    .with_benchmark(bars, &simulation.equity_curve, config.bars_per_year);

    Ok(BacktestResult { simulation, report })
}
