//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::signals::SignalKind;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::comparison::{self, ComparisonResult, RunOutcome};
use crate::domain::config_validation::{
    build_backtest_config, build_criteria, build_data_settings, DataSettings,
};
use crate::domain::error::ScalperError;
use crate::domain::evaluation::{meets_criteria, ProfitabilityCriteria};
use crate::domain::metrics::MetricsReport;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{parse_param, StrategyConfig};
use crate::ports::data_port::DataPort;
use crate::ports::signal_port::SignalPort;

#[derive(Parser, Debug)]
#[command(name = "scalper", about = "Signal backtester and strategy comparison")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one strategy configuration
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Signal source: sma, rsi, bollinger or ema_rsi
        #[arg(short, long, default_value = "sma")]
        strategy: String,
        /// Strategy parameter override, e.g. --param short_window=10
        #[arg(short, long = "param")]
        params: Vec<String>,
        #[arg(long)]
        symbol: Option<String>,
        /// Directory holding {symbol}.csv files
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Backtest the predefined configurations of a strategy and rank them
    Compare {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "sma")]
        strategy: String,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Run configurations one after another
        #[arg(long)]
        sequential: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(command: Command) -> Result<(), ScalperError> {
    match command {
        Command::Backtest {
            config,
            strategy,
            params,
            symbol,
            data,
        } => run_backtest(
            config.as_deref(),
            &strategy,
            &params,
            symbol.as_deref(),
            data.as_deref(),
        ),
        Command::Compare {
            config,
            strategy,
            symbol,
            data,
            sequential,
        } => run_compare(
            config.as_deref(),
            &strategy,
            symbol.as_deref(),
            data.as_deref(),
            sequential,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, data } => run_list_symbols(config.as_deref(), data.as_deref()),
    }
}

/// Load an INI file, or an empty configuration (all defaults) when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ScalperError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => FileConfigAdapter::from_string(""),
    }
}

struct Session {
    backtest: BacktestConfig,
    criteria: ProfitabilityCriteria,
    data: DataSettings,
}

fn load_session(
    config_path: Option<&Path>,
    symbol: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<Session, ScalperError> {
    let adapter = load_config(config_path)?;
    let backtest = build_backtest_config(&adapter)?;
    let criteria = build_criteria(&adapter)?;
    let mut data = build_data_settings(&adapter)?;
    if let Some(symbol) = symbol {
        data.symbol = symbol.to_string();
    }
    if let Some(dir) = data_dir {
        data.path = Some(dir.display().to_string());
    }
    Ok(Session {
        backtest,
        criteria,
        data,
    })
}

fn data_adapter(data: &DataSettings) -> Result<CsvAdapter, ScalperError> {
    let path = data.path.as_ref().ok_or_else(|| ScalperError::ConfigMissing {
        section: "data".to_string(),
        key: "path".to_string(),
    })?;
    Ok(CsvAdapter::new(PathBuf::from(path)))
}

fn load_bars(data: &DataSettings) -> Result<Vec<Bar>, ScalperError> {
    let adapter = data_adapter(data)?;
    let bars = adapter.fetch_bars(&data.symbol, data.start_date, data.end_date)?;
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => eprintln!(
            "Loaded {} bars for {} ({} to {})",
            bars.len(),
            data.symbol,
            first.timestamp.date(),
            last.timestamp.date()
        ),
        _ => eprintln!("Loaded 0 bars for {}", data.symbol),
    }
    Ok(bars)
}

fn resolve_kind(name: &str) -> Result<SignalKind, ScalperError> {
    SignalKind::parse(name).ok_or_else(|| ScalperError::ConfigInvalid {
        section: "strategy".to_string(),
        key: "name".to_string(),
        reason: format!("unknown strategy '{}', expected sma, rsi, bollinger or ema_rsi", name),
    })
}

pub fn build_strategy(kind: SignalKind, overrides: &[String]) -> Result<StrategyConfig, ScalperError> {
    let mut config = kind.default_config();
    for pair in overrides {
        let (key, value) = parse_param(pair)?;
        config.params.insert(key, value);
    }
    Ok(config)
}

fn run_backtest(
    config_path: Option<&Path>,
    strategy: &str,
    overrides: &[String],
    symbol: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<(), ScalperError> {
    let kind = resolve_kind(strategy)?;
    let strategy = build_strategy(kind, overrides)?;
    let session = load_session(config_path, symbol, data_dir)?;
    let bars = load_bars(&session.data)?;

    eprintln!("Running strategy: {}", strategy);
    let signals = kind.source().generate_signals(&bars, &strategy)?;
    eprintln!(
        "  Signals: {} entries, {} exits",
        signals.entry_count(),
        signals.exit_count()
    );

    let result = backtest_engine::run_backtest(&bars, &signals, &session.backtest)?;
    print_report(&result.report);
    if result.simulation.skipped_entries > 0 {
        eprintln!(
            "Skipped Entries:  {} (insufficient funds)",
            result.simulation.skipped_entries
        );
    }

    let verdict = if meets_criteria(&result.report, &session.criteria) {
        "PASS"
    } else {
        "FAIL"
    };
    eprintln!("\nProfitability:    {}", verdict);
    Ok(())
}

fn run_compare(
    config_path: Option<&Path>,
    strategy: &str,
    symbol: Option<&str>,
    data_dir: Option<&Path>,
    sequential: bool,
) -> Result<(), ScalperError> {
    let kind = resolve_kind(strategy)?;
    let mut session = load_session(config_path, symbol, data_dir)?;
    if sequential {
        session.backtest.parallel = false;
    }
    let bars = load_bars(&session.data)?;
    let configurations = kind.predefined_configurations();

    eprintln!(
        "Comparing {} {} configurations...",
        configurations.len(),
        kind.name()
    );
    let result = comparison::compare(
        &configurations,
        &bars,
        kind.source(),
        &session.backtest,
        &session.criteria,
    );
    print_comparison(&result);
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), ScalperError> {
    let session = load_session(Some(config_path), None, None)?;
    let sim = &session.backtest.simulation;

    eprintln!("Config validated successfully");
    eprintln!("\nBacktest:");
    eprintln!("  initial_cash:    {:.2}", sim.initial_cash);
    eprintln!("  commission_rate: {}", sim.commission_rate);
    eprintln!("  slippage_rate:   {}", sim.slippage_rate);
    eprintln!("  sizing:          {:?}", sim.sizing);
    eprintln!("  bars_per_year:   {}", session.backtest.bars_per_year);
    eprintln!("  parallel:        {}", session.backtest.parallel);
    eprintln!("\nCriteria:");
    eprintln!("  min_return:      {:.2}%", session.criteria.min_return * 100.0);
    eprintln!("  min_sharpe:      {:.2}", session.criteria.min_sharpe);
    eprintln!(
        "  max_drawdown:    {:.1}%",
        session.criteria.max_drawdown_limit * 100.0
    );
    eprintln!("  min_trades:      {}", session.criteria.min_trades);
    eprintln!("\nData:");
    eprintln!("  symbol:          {}", session.data.symbol);
    eprintln!(
        "  path:            {}",
        session.data.path.as_deref().unwrap_or("(not set)")
    );
    let fmt_date = |d: Option<chrono::NaiveDate>| d.map_or("(open)".to_string(), |d| d.to_string());
    eprintln!(
        "  range:           {} to {}",
        fmt_date(session.data.start_date),
        fmt_date(session.data.end_date)
    );
    Ok(())
}

fn run_list_symbols(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<(), ScalperError> {
    let session = load_session(config_path, None, data_dir)?;
    let symbols = data_adapter(&session.data)?.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        eprintln!("{} symbols found", symbols.len());
        for symbol in &symbols {
            println!("{}", symbol);
        }
    }
    Ok(())
}

fn format_profit_factor(report: &MetricsReport) -> String {
    if report.profit_factor_is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", report.profit_factor)
    }
}

pub fn print_report(report: &MetricsReport) {
    eprintln!("\n=== Results ===");
    eprintln!("Final Value:      {:.2}", report.final_value);
    eprintln!("Total Return:     {:.2}%", report.total_return * 100.0);
    eprintln!("Annual Return:    {:.2}%", report.annualized_return * 100.0);
    eprintln!("Buy & Hold:       {:.2}%", report.buy_hold_return * 100.0);
    eprintln!("Alpha:            {:.2}%", report.alpha * 100.0);
    eprintln!("Beta:             {:.2}", report.beta);
    eprintln!("Info Ratio:       {:.2}", report.information_ratio);
    eprintln!("Volatility:       {:.2}%", report.volatility * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", report.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", report.sortino_ratio);
    eprintln!("Calmar Ratio:     {:.2}", report.calmar_ratio);
    eprintln!("Max Drawdown:     {:.1}%", report.max_drawdown * 100.0);
    eprintln!("Avg Drawdown:     {:.1}%", report.avg_drawdown * 100.0);
    eprintln!("DD Duration:      {} bars", report.max_drawdown_duration);
    eprintln!("VaR 95%:          {:.2}%", report.value_at_risk_95 * 100.0);
    eprintln!("Total Trades:     {}", report.total_trades);
    eprintln!("Win Rate:         {:.1}%", report.win_rate * 100.0);
    eprintln!("Profit Factor:    {}", format_profit_factor(report));
    eprintln!("Avg Trade:        {:.2}", report.avg_trade_return);
    eprintln!("Exposure:         {:.1}%", report.market_exposure * 100.0);
}

pub fn print_comparison(result: &ComparisonResult) {
    eprintln!("\n=== Ranking ===");
    eprintln!(
        "{:>4}  {:<40} {:>9} {:>7} {:>8} {:>6}  {}",
        "Rank", "Configuration", "Return", "Sharpe", "MaxDD", "Trades", "Pass"
    );
    for entry in &result.entries {
        match &entry.outcome {
            RunOutcome::Completed {
                report,
                rank,
                passed,
            } => eprintln!(
                "{:>4}  {:<40} {:>8.2}% {:>7.2} {:>7.1}% {:>6}  {}",
                rank,
                entry.config.label(),
                report.total_return * 100.0,
                report.sharpe_ratio,
                report.max_drawdown * 100.0,
                report.total_trades,
                if *passed { "yes" } else { "no" }
            ),
            RunOutcome::Failed { error } => eprintln!(
                "{:>4}  {:<40} failed: {}",
                "-",
                entry.config.label(),
                error
            ),
        }
    }

    let summary = result.summary();
    eprintln!("\n=== Summary ===");
    eprintln!("Configurations:   {}", summary.count);
    eprintln!("Succeeded:        {}", summary.succeeded);
    eprintln!("Failed:           {}", summary.failed);
    eprintln!("Passed Criteria:  {}", summary.passed);
    eprintln!("Average Return:   {:.2}%", summary.average_return * 100.0);
    eprintln!("Average Sharpe:   {:.2}", summary.average_sharpe);
    if let Some(best) = &summary.best {
        eprintln!("Best:             {}", best);
    }
    if let Some(worst) = &summary.worst {
        eprintln!("Worst:            {}", worst);
    }
}
