//! Performance metrics and statistics.
//!
//! Every ratio resolves to a fixed sentinel instead of dividing by zero:
//! a strategy that never trades, or never loses, is a normal outcome.

use std::collections::BTreeMap;

use super::error::ScalperError;
use super::ohlcv::{self, Bar};
use super::portfolio::EquityCurve;
use super::position::Trade;
use super::stats;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsReport {
    pub num_bars: usize,
    pub initial_cash: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    /// Mean depth of the drawdown episodes (<= 0).
    pub avg_drawdown: f64,
    pub calmar_ratio: f64,
    pub recovery_factor: f64,
    pub value_at_risk_95: f64,
    pub value_at_risk_99: f64,
    pub cvar_95: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub forced_closes: usize,
    pub win_rate: f64,
    /// `f64::INFINITY` when there are wins and no losses.
    pub profit_factor: f64,
    /// Mean net PnL per trade.
    pub avg_trade_return: f64,
    /// Mean `return_pct` per trade.
    pub avg_trade_return_pct: f64,
    pub avg_win: f64,
    /// Mean net PnL of losing trades (negative).
    pub avg_loss: f64,
    pub largest_win: f64,
    /// Most negative net PnL.
    pub largest_loss: f64,
    pub win_loss_ratio: f64,
    pub avg_holding_bars: f64,
    pub market_exposure: f64,
    pub buy_hold_return: f64,
    pub alpha: f64,
    /// `alpha` over the annualized tracking error against buy-and-hold.
    pub information_ratio: f64,
    /// Covariance of strategy and buy-and-hold returns over the benchmark variance.
    pub beta: f64,
}

/// Compute the full report for one simulated run.
pub fn analyze(
    equity_curve: &EquityCurve,
    trades: &[Trade],
    initial_cash: f64,
    bars_per_year: u32,
) -> Result<MetricsReport, ScalperError> {
    if bars_per_year == 0 {
        return Err(ScalperError::configuration(
            "bars_per_year",
            "must be a positive integer",
        ));
    }
    if !initial_cash.is_finite() || initial_cash <= 0.0 {
        return Err(ScalperError::configuration(
            "initial_cash",
            format!("must be positive, got {initial_cash}"),
        ));
    }
    if equity_curve.is_empty() {
        return Err(ScalperError::InsufficientData {
            bars: 0,
            minimum: 1,
        });
    }

    let equity = equity_curve.values();
    let num_bars = equity.len();
    let first = equity[0];
    let last = equity[num_bars - 1];
    let periods_per_year = bars_per_year as f64;
    let annualizer = periods_per_year.sqrt();

    let total_return = if first > 0.0 { last / first - 1.0 } else { 0.0 };
    let annualized_return = {
        let growth = (1.0 + total_return).powf(periods_per_year / num_bars as f64) - 1.0;
        if growth.is_finite() { growth } else { 0.0 }
    };

    let returns = stats::simple_returns(&equity);
    let mean_return = stats::mean(&returns);
    let std_return = stats::std_dev(&returns);

    let volatility = std_return * annualizer;
    let sharpe_ratio = if std_return > 0.0 {
        mean_return / std_return * annualizer
    } else {
        0.0
    };

    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_std = stats::std_dev(&downside);
    let sortino_ratio = if downside_std > 0.0 {
        mean_return / downside_std * annualizer
    } else {
        0.0
    };

    let drawdown = stats::drawdown_scan(&equity);
    let max_drawdown = drawdown.max_drawdown;
    let (calmar_ratio, recovery_factor) = if max_drawdown < 0.0 {
        (
            annualized_return / max_drawdown.abs(),
            total_return / max_drawdown.abs(),
        )
    } else {
        (0.0, 0.0)
    };

    let value_at_risk_95 = stats::percentile(&returns, 5.0);
    let value_at_risk_99 = stats::percentile(&returns, 1.0);
    let tail: Vec<f64> = returns
        .iter()
        .copied()
        .filter(|r| *r <= value_at_risk_95)
        .collect();
    let cvar_95 = stats::mean(&tail);

    let trade_stats = TradeStats::from_trades(trades);

    Ok(MetricsReport {
        num_bars,
        initial_cash,
        final_value: last,
        total_return,
        annualized_return,
        volatility,
        sharpe_ratio,
        sortino_ratio,
        max_drawdown,
        max_drawdown_duration: drawdown.max_duration,
        avg_drawdown: drawdown.avg_drawdown,
        calmar_ratio,
        recovery_factor,
        value_at_risk_95,
        value_at_risk_99,
        cvar_95,
        skewness: stats::skewness(&returns),
        kurtosis: stats::kurtosis(&returns),
        total_trades: trade_stats.total,
        winning_trades: trade_stats.won,
        losing_trades: trade_stats.lost,
        forced_closes: trade_stats.forced,
        win_rate: trade_stats.win_rate(),
        profit_factor: trade_stats.profit_factor(),
        avg_trade_return: trade_stats.avg_pnl(),
        avg_trade_return_pct: trade_stats.avg_return_pct(),
        avg_win: trade_stats.avg_win(),
        avg_loss: trade_stats.avg_loss(),
        largest_win: trade_stats.largest_win,
        largest_loss: trade_stats.largest_loss,
        win_loss_ratio: trade_stats.win_loss_ratio(),
        avg_holding_bars: trade_stats.avg_holding_bars(),
        market_exposure: equity_curve.exposure(),
        buy_hold_return: 0.0,
        alpha: 0.0,
        information_ratio: 0.0,
        beta: 0.0,
    })
}

impl MetricsReport {
    /// Compare the run against holding the asset over the same `bars`.
    ///
    /// `equity_curve` must be the curve simulated over `bars`. Information
    /// ratio and beta stay 0.0 when the tracking error or the benchmark
    /// variance is zero, or when the two series do not line up.
    pub fn with_benchmark(
        mut self,
        bars: &[Bar],
        equity_curve: &EquityCurve,
        bars_per_year: u32,
    ) -> Self {
        self.buy_hold_return = ohlcv::buy_and_hold_return(bars);
        self.alpha = self.total_return - self.buy_hold_return;

        let (strategy, benchmark) = paired_returns(equity_curve, bars);
        let active: Vec<f64> = strategy
            .iter()
            .zip(&benchmark)
            .map(|(s, b)| s - b)
            .collect();
        let tracking_error = stats::std_dev(&active) * (bars_per_year as f64).sqrt();
        self.information_ratio = if tracking_error > 0.0 {
            self.alpha / tracking_error
        } else {
            0.0
        };

        let benchmark_variance = stats::covariance(&benchmark, &benchmark);
        self.beta = if benchmark_variance > 0.0 {
            stats::covariance(&strategy, &benchmark) / benchmark_variance
        } else {
            0.0
        };
        self
    }

    pub fn profit_factor_is_infinite(&self) -> bool {
        self.profit_factor.is_infinite()
    }

    /// Flat metric name to value mapping. Counts are widened to f64.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("num_bars", self.num_bars as f64),
            ("initial_cash", self.initial_cash),
            ("final_value", self.final_value),
            ("total_return", self.total_return),
            ("annualized_return", self.annualized_return),
            ("volatility", self.volatility),
            ("sharpe_ratio", self.sharpe_ratio),
            ("sortino_ratio", self.sortino_ratio),
            ("max_drawdown", self.max_drawdown),
            ("max_drawdown_duration", self.max_drawdown_duration as f64),
            ("avg_drawdown", self.avg_drawdown),
            ("calmar_ratio", self.calmar_ratio),
            ("recovery_factor", self.recovery_factor),
            ("value_at_risk_95", self.value_at_risk_95),
            ("value_at_risk_99", self.value_at_risk_99),
            ("cvar_95", self.cvar_95),
            ("skewness", self.skewness),
            ("kurtosis", self.kurtosis),
            ("total_trades", self.total_trades as f64),
            ("winning_trades", self.winning_trades as f64),
            ("losing_trades", self.losing_trades as f64),
            ("forced_closes", self.forced_closes as f64),
            ("win_rate", self.win_rate),
            ("profit_factor", self.profit_factor),
            ("avg_trade_return", self.avg_trade_return),
            ("avg_trade_return_pct", self.avg_trade_return_pct),
            ("avg_win", self.avg_win),
            ("avg_loss", self.avg_loss),
            ("largest_win", self.largest_win),
            ("largest_loss", self.largest_loss),
            ("win_loss_ratio", self.win_loss_ratio),
            ("avg_holding_bars", self.avg_holding_bars),
            ("market_exposure", self.market_exposure),
            ("buy_hold_return", self.buy_hold_return),
            ("alpha", self.alpha),
            ("information_ratio", self.information_ratio),
            ("beta", self.beta),
        ])
    }
}

/// Bar-over-bar returns of the strategy and of the close, over the bars
/// where both bases are non-zero. Empty when the curve and bars differ in
/// length or timestamps.
fn paired_returns(equity_curve: &EquityCurve, bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    let points = &equity_curve.points;
    let aligned = points.len() == bars.len()
        && points.iter().zip(bars).all(|(p, b)| p.timestamp == b.timestamp);
    if !aligned {
        return (Vec::new(), Vec::new());
    }
    points
        .windows(2)
        .zip(bars.windows(2))
        .filter(|(p, b)| p[0].equity != 0.0 && b[0].close != 0.0)
        .map(|(p, b)| (p[1].equity / p[0].equity - 1.0, b[1].close / b[0].close - 1.0))
        .unzip()
}

#[derive(Debug, Default)]
struct TradeStats {
    total: usize,
    won: usize,
    lost: usize,
    forced: usize,
    gross_wins: f64,
    gross_losses: f64,
    pnl_sum: f64,
    return_pct_sum: f64,
    largest_win: f64,
    largest_loss: f64,
    holding_bars: usize,
}

impl TradeStats {
    fn from_trades(trades: &[Trade]) -> Self {
        let mut s = TradeStats::default();
        for trade in trades {
            let pnl = trade.net_pnl;
            s.total += 1;
            s.pnl_sum += pnl;
            s.return_pct_sum += trade.return_pct;
            s.holding_bars += trade.holding_bars;
            if trade.forced_close {
                s.forced += 1;
            }
            if trade.is_win() {
                s.won += 1;
                s.gross_wins += pnl;
                s.largest_win = s.largest_win.max(pnl);
            } else if trade.is_loss() {
                s.lost += 1;
                s.gross_losses += pnl;
                s.largest_loss = s.largest_loss.min(pnl);
            }
        }
        s
    }

    fn per_trade(&self, sum: f64) -> f64 {
        if self.total > 0 {
            sum / self.total as f64
        } else {
            0.0
        }
    }

    fn win_rate(&self) -> f64 {
        self.per_trade(self.won as f64)
    }

    fn avg_pnl(&self) -> f64 {
        self.per_trade(self.pnl_sum)
    }

    fn avg_return_pct(&self) -> f64 {
        self.per_trade(self.return_pct_sum)
    }

    fn avg_holding_bars(&self) -> f64 {
        self.per_trade(self.holding_bars as f64)
    }

    fn profit_factor(&self) -> f64 {
        if self.won == 0 {
            0.0
        } else if self.lost == 0 {
            f64::INFINITY
        } else {
            self.gross_wins / self.gross_losses.abs()
        }
    }

    fn avg_win(&self) -> f64 {
        if self.won > 0 {
            self.gross_wins / self.won as f64
        } else {
            0.0
        }
    }

    fn avg_loss(&self) -> f64 {
        if self.lost > 0 {
            self.gross_losses / self.lost as f64
        } else {
            0.0
        }
    }

    fn win_loss_ratio(&self) -> f64 {
        let avg_loss = self.avg_loss();
        if avg_loss != 0.0 {
            (self.avg_win() / avg_loss).abs()
        } else {
            0.0
        }
    }
}
