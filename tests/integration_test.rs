//! End-to-end scenarios across simulate -> analyze -> evaluate -> compare.

mod common;

use approx::assert_abs_diff_eq;
use common::*;
use scalper::adapters::signals::{SignalKind, SmaCrossover};
use scalper::domain::backtest::{run_backtest, simulate, BacktestConfig};
use scalper::domain::comparison::compare;
use scalper::domain::error::ScalperError;
use scalper::domain::evaluation::{meets_criteria, rank, ProfitabilityCriteria};
use scalper::domain::execution::{SimulationParams, Sizing};
use scalper::domain::metrics::analyze;
use scalper::domain::ohlcv::slice_by_date;
use scalper::domain::signal::SignalSet;
use scalper::domain::strategy::StrategyConfig;
use scalper::ports::data_port::DataPort;
use scalper::ports::signal_port::SignalPort;

fn frictionless(cash: f64) -> SimulationParams {
    SimulationParams {
        initial_cash: cash,
        commission_rate: 0.0,
        slippage_rate: 0.0,
        sizing: Sizing::Fractional,
    }
}

fn config_with(params: SimulationParams) -> BacktestConfig {
    BacktestConfig {
        simulation: params,
        ..BacktestConfig::default()
    }
}

mod simulation_scenarios {
    use super::*;

    #[test]
    fn rising_ten_bars_single_round_trip() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + 5.0 * i as f64).collect();
        let bars = bars_from_closes(&closes);
        let sigs = signals(&bars, &[0], &[9]);

        let result = run_backtest(&bars, &sigs, &config_with(frictionless(1000.0))).unwrap();

        assert_eq!(result.report.total_trades, 1);
        assert!(result.simulation.trades[0].net_pnl > 0.0);
        assert!(!result.simulation.trades[0].forced_close);
        assert_eq!(result.report.max_drawdown, 0.0);
        assert_abs_diff_eq!(result.report.total_return, 0.45, epsilon = 1e-12);
        assert!(result.report.profit_factor_is_infinite());
    }

    #[test]
    fn same_bar_enter_and_exit_never_opens() {
        let bars = bars_from_closes(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let sigs = signals(&bars, &[2], &[2]);

        let result = run_backtest(&bars, &sigs, &config_with(frictionless(1000.0))).unwrap();

        assert_eq!(result.report.total_trades, 0);
        assert!(result.simulation.equity_curve.points.iter().all(|p| !p.in_position));
        assert_eq!(result.simulation.final_cash, 1000.0);
    }

    #[test]
    fn commission_and_slippage_round_trip() {
        let bars = bars_from_closes(&[100.0, 110.0]);
        let sigs = signals(&bars, &[0], &[1]);
        let params = SimulationParams {
            initial_cash: 1000.0,
            commission_rate: 0.01,
            slippage_rate: 0.001,
            sizing: Sizing::Fractional,
        };

        let sim = simulate(&bars, &sigs, &params).unwrap();
        assert_eq!(sim.trades.len(), 1);
        let trade = &sim.trades[0];
        let q = trade.quantity;

        let entry_fill = 100.0 * (1.0 + 0.001);
        let exit_fill = 110.0 * (1.0 - 0.001);
        let expected = q * exit_fill * (1.0 - 0.01) - q * entry_fill * (1.0 + 0.01);

        assert_abs_diff_eq!(q, 1000.0 / (entry_fill * 1.01), epsilon = 1e-9);
        assert_abs_diff_eq!(trade.entry_price, entry_fill, epsilon = 1e-12);
        assert_abs_diff_eq!(trade.exit_price, exit_fill, epsilon = 1e-12);
        assert_abs_diff_eq!(trade.net_pnl, expected, epsilon = 1e-6);
        assert_abs_diff_eq!(trade.gross_pnl, q * (exit_fill - entry_fill), epsilon = 1e-6);
        assert_abs_diff_eq!(sim.final_cash, 1000.0 + expected, epsilon = 1e-6);
    }

    #[test]
    fn no_signals_is_a_flat_run() {
        let bars = generate_bars(60, 100.0);
        let sigs = SignalSet::empty(&bars);

        let result = run_backtest(&bars, &sigs, &config_with(frictionless(1000.0))).unwrap();

        assert_eq!(result.report.total_trades, 0);
        assert_eq!(result.report.total_return, 0.0);
        assert_eq!(result.report.sharpe_ratio, 0.0);
        assert_eq!(result.report.max_drawdown, 0.0);
        assert_eq!(result.report.profit_factor, 0.0);
    }

    #[test]
    fn open_position_is_liquidated_at_last_close() {
        let bars = bars_from_closes(&[100.0, 90.0, 95.0, 120.0]);
        let sigs = signals(&bars, &[1], &[]);

        let sim = simulate(&bars, &sigs, &frictionless(900.0)).unwrap();

        assert!(!sim.final_position.is_open);
        let last = sim.trades.last().unwrap();
        assert!(last.forced_close);
        assert_eq!(last.exit_price, 120.0);
        assert_abs_diff_eq!(sim.final_cash, 1200.0, epsilon = 1e-9);
    }

    #[test]
    fn losing_trades_only_gives_zero_profit_factor() {
        let bars = bars_from_closes(&[100.0, 90.0, 95.0, 80.0, 85.0]);
        let sigs = signals(&bars, &[0, 2], &[1, 3]);

        let result = run_backtest(&bars, &sigs, &config_with(frictionless(1000.0))).unwrap();

        assert_eq!(result.report.total_trades, 2);
        assert_eq!(result.report.winning_trades, 0);
        assert_eq!(result.report.profit_factor, 0.0);
        assert!(result.report.avg_loss < 0.0);
        assert!(result.report.max_drawdown < 0.0);
    }

    #[test]
    fn analyze_rejects_zero_bars_per_year() {
        let bars = bars_from_closes(&[100.0, 101.0]);
        let sim = simulate(&bars, &SignalSet::empty(&bars), &frictionless(1000.0)).unwrap();
        let err = analyze(&sim.equity_curve, &sim.trades, 1000.0, 0).unwrap_err();
        assert!(matches!(err, ScalperError::Configuration { .. }));
    }
}

mod evaluation_pipeline {
    use super::*;

    #[test]
    fn steady_winner_meets_relaxed_criteria() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let bars = bars_from_closes(&closes);
        let sigs = signals(&bars, &[0, 10, 20, 30], &[9, 19, 29]);

        let result = run_backtest(&bars, &sigs, &config_with(frictionless(1000.0))).unwrap();
        let criteria = ProfitabilityCriteria {
            min_trades: 4,
            ..ProfitabilityCriteria::default()
        };

        assert_eq!(result.report.total_trades, 4);
        assert!(meets_criteria(&result.report, &criteria));
    }

    #[test]
    fn rank_orders_real_reports() {
        let bars = generate_bars(120, 100.0);
        let reports: Vec<_> = [(0usize, 119usize), (30, 60), (60, 90)]
            .iter()
            .map(|&(enter, exit)| {
                let sigs = signals(&bars, &[enter], &[exit]);
                run_backtest(&bars, &sigs, &config_with(frictionless(1000.0)))
                    .unwrap()
                    .report
            })
            .collect();

        let ranked = rank(&reports);
        assert_eq!(ranked.len(), 3);
        for pair in ranked.windows(2) {
            assert!(pair[0].report.sharpe_ratio >= pair[1].report.sharpe_ratio);
        }
    }
}

mod comparison_runs {
    use super::*;

    /// Delegates to the SMA source, except configurations flagged `truncate`
    /// return one signal short.
    fn flaky_source(bars: &[Bar], cfg: &StrategyConfig) -> Result<SignalSet, ScalperError> {
        let mut set = SmaCrossover.generate_signals(bars, cfg)?;
        if cfg.get("truncate").is_some() {
            set.timestamps.pop();
            set.enter.pop();
            set.exit.pop();
        }
        Ok(set)
    }

    #[test]
    fn one_alignment_failure_among_three() {
        let bars = generate_bars(200, 100.0);
        let configs = vec![
            scalper::adapters::signals::sma_crossover::config(5, 15),
            scalper::adapters::signals::sma_crossover::config(10, 30).with_param("truncate", 1.0),
            scalper::adapters::signals::sma_crossover::config(20, 50),
        ];

        let result = compare(
            &configs,
            &bars,
            &flaky_source,
            &BacktestConfig::default(),
            &ProfitabilityCriteria::default(),
        );

        assert_eq!(result.successes().count(), 2);
        let failures: Vec<_> = result.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].position, 1);
        assert!(matches!(
            failures[0].error(),
            Some(ScalperError::DataAlignment { .. })
        ));

        let mut ranks: Vec<usize> = result.successes().filter_map(|e| e.rank()).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn predefined_sets_run_end_to_end() {
        let bars = generate_bars(300, 100.0);
        for kind in SignalKind::ALL {
            let configs = kind.predefined_configurations();
            let result = compare(
                &configs,
                &bars,
                kind.source(),
                &BacktestConfig::default(),
                &ProfitabilityCriteria::default(),
            );
            assert_eq!(result.len(), configs.len());
            assert_eq!(result.failures().count(), 0, "{} had failures", kind.name());
            let summary = result.summary();
            assert_eq!(summary.succeeded, configs.len());
            assert!(summary.best.is_some());
        }
    }

    #[test]
    fn invalid_parameters_fail_only_their_entry() {
        let bars = generate_bars(100, 100.0);
        let configs = vec![
            scalper::adapters::signals::sma_crossover::config(30, 10),
            scalper::adapters::signals::sma_crossover::config(5, 20),
        ];
        let result = compare(
            &configs,
            &bars,
            &SmaCrossover,
            &BacktestConfig::default(),
            &ProfitabilityCriteria::default(),
        );
        assert_eq!(result.successes().count(), 1);
        assert!(matches!(
            result.failures().next().and_then(|e| e.error()),
            Some(ScalperError::SignalGeneration { .. })
        ));
    }
}

mod data_pipeline {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn mock_port_feeds_a_backtest() {
        let port = MockDataPort::new().with_bars("BTC-USD", generate_bars(90, 30000.0));
        let start = NaiveDate::from_ymd_opt(2024, 1, 15);
        let end = NaiveDate::from_ymd_opt(2024, 2, 29);

        let bars = port.fetch_bars("BTC-USD", start, end).unwrap();
        assert_eq!(bars.first().unwrap().timestamp.date(), start.unwrap());
        assert_eq!(bars.last().unwrap().timestamp.date(), end.unwrap());

        let cfg = scalper::adapters::signals::sma_crossover::config(3, 8);
        let sigs = SmaCrossover.generate_signals(&bars, &cfg).unwrap();
        let result = run_backtest(&bars, &sigs, &BacktestConfig::default()).unwrap();
        assert_eq!(result.report.num_bars, bars.len());
        assert!(!result.simulation.final_position.is_open);
    }

    #[test]
    fn mock_port_errors_surface() {
        let port = MockDataPort::new().with_error("ETH-USD", "exchange offline");
        let err = port.fetch_bars("ETH-USD", None, None).unwrap_err();
        assert!(matches!(err, ScalperError::DataLoad { .. }));
    }

    #[test]
    fn slice_outside_range_is_insufficient_data() {
        let bars = generate_bars(10, 100.0);
        let start = NaiveDate::from_ymd_opt(2030, 1, 1);
        let err = slice_by_date(&bars, start, None).unwrap_err();
        assert!(matches!(err, ScalperError::InsufficientData { .. }));
    }
}
