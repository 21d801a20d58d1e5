//! Runs one backtest per strategy configuration and ranks the outcomes.

use rayon::prelude::*;
use tracing::{info, warn};

use super::backtest::{self, BacktestConfig};
use super::error::ScalperError;
use super::evaluation::{self, ProfitabilityCriteria};
use super::metrics::MetricsReport;
use super::ohlcv::Bar;
use super::strategy::StrategyConfig;
use crate::ports::signal_port::SignalPort;

#[derive(Debug)]
pub enum RunOutcome {
    Completed {
        report: MetricsReport,
        /// 1-based, among successful runs only.
        rank: usize,
        passed: bool,
    },
    Failed {
        error: ScalperError,
    },
}

#[derive(Debug)]
pub struct ComparisonEntry {
    /// Index of the configuration in the input slice.
    pub position: usize,
    pub config: StrategyConfig,
    pub outcome: RunOutcome,
}

impl ComparisonEntry {
    pub fn report(&self) -> Option<&MetricsReport> {
        match &self.outcome {
            RunOutcome::Completed { report, .. } => Some(report),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn rank(&self) -> Option<usize> {
        match self.outcome {
            RunOutcome::Completed { rank, .. } => Some(rank),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { passed: true, .. })
    }

    pub fn error(&self) -> Option<&ScalperError> {
        match &self.outcome {
            RunOutcome::Failed { error } => Some(error),
            RunOutcome::Completed { .. } => None,
        }
    }
}

/// Successful entries in rank order, followed by failures in input order.
#[derive(Debug, Default)]
pub struct ComparisonResult {
    pub entries: Vec<ComparisonEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSummary {
    pub count: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub passed: usize,
    /// Mean total return over successful runs, 0 when none succeeded.
    pub average_return: f64,
    /// Mean Sharpe ratio over successful runs, 0 when none succeeded.
    pub average_sharpe: f64,
    pub best: Option<String>,
    /// Lowest-ranked successful configuration.
    pub worst: Option<String>,
}

impl ComparisonResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &ComparisonEntry> {
        self.entries.iter().filter(|e| e.report().is_some())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ComparisonEntry> {
        self.entries.iter().filter(|e| e.error().is_some())
    }

    pub fn passing(&self) -> impl Iterator<Item = &ComparisonEntry> {
        self.entries.iter().filter(|e| e.passed())
    }

    pub fn best(&self) -> Option<&ComparisonEntry> {
        self.successes().next()
    }

    pub fn worst(&self) -> Option<&ComparisonEntry> {
        self.successes().last()
    }

    pub fn summary(&self) -> ComparisonSummary {
        let reports: Vec<&MetricsReport> =
            self.successes().filter_map(ComparisonEntry::report).collect();
        let average = |field: fn(&MetricsReport) -> f64| {
            if reports.is_empty() {
                0.0
            } else {
                reports.iter().map(|r| field(r)).sum::<f64>() / reports.len() as f64
            }
        };
        ComparisonSummary {
            count: self.entries.len(),
            succeeded: reports.len(),
            failed: self.failures().count(),
            passed: self.passing().count(),
            average_return: average(|r| r.total_return),
            average_sharpe: average(|r| r.sharpe_ratio),
            best: self.best().map(|e| e.config.label()),
            worst: self.worst().map(|e| e.config.label()),
        }
    }
}

fn run_one(
    bars: &[Bar],
    source: &dyn SignalPort,
    strategy: &StrategyConfig,
    config: &BacktestConfig,
) -> Result<MetricsReport, ScalperError> {
    let signals = source.generate_signals(bars, strategy)?;
    let result = backtest::run_backtest(bars, &signals, config)?;
    Ok(result.report)
}

/// Backtest every configuration against the same bars.
///
/// A failing configuration is recorded in its entry and never stops the
/// others. Results do not depend on `config.parallel`.
pub fn compare(
    configurations: &[StrategyConfig],
    bars: &[Bar],
    source: &dyn SignalPort,
    config: &BacktestConfig,
    criteria: &ProfitabilityCriteria,
) -> ComparisonResult {
    info!(
        configurations = configurations.len(),
        bars = bars.len(),
        parallel = config.parallel,
        "starting comparison"
    );

    let outcomes: Vec<Result<MetricsReport, ScalperError>> = if config.parallel {
        configurations
            .par_iter()
            .map(|strategy| run_one(bars, source, strategy, config))
            .collect()
    } else {
        configurations
            .iter()
            .map(|strategy| run_one(bars, source, strategy, config))
            .collect()
    };

    let mut reports: Vec<(usize, MetricsReport)> = Vec::new();
    let mut failures: Vec<ComparisonEntry> = Vec::new();
    for (position, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(report) => reports.push((position, report)),
            Err(error) => {
                warn!(
                    config = %configurations[position],
                    kind = error.kind(),
                    %error,
                    "configuration failed"
                );
                failures.push(ComparisonEntry {
                    position,
                    config: configurations[position].clone(),
                    outcome: RunOutcome::Failed { error },
                });
            }
        }
    }

    let refs: Vec<&MetricsReport> = reports.iter().map(|(_, r)| r).collect();
    let order = evaluation::ranking_order(&refs);

    let mut slots: Vec<Option<(usize, MetricsReport)>> = reports.into_iter().map(Some).collect();
    let mut entries = Vec::with_capacity(configurations.len());
    for (i, idx) in order.into_iter().enumerate() {
        if let Some((position, report)) = slots[idx].take() {
            let passed = evaluation::meets_criteria(&report, criteria);
            entries.push(ComparisonEntry {
                position,
                config: configurations[position].clone(),
                outcome: RunOutcome::Completed {
                    report,
                    rank: i + 1,
                    passed,
                },
            });
        }
    }
    entries.extend(failures);

    let result = ComparisonResult { entries };
    let summary = result.summary();
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        passed = summary.passed,
        "comparison complete"
    );
    result
}
