//! Configuration validation.
//!
//! Turns raw `[backtest]`, `[criteria]` and `[data]` settings into validated
//! domain values before any run starts.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::ScalperError;
use crate::domain::evaluation::ProfitabilityCriteria;
use crate::domain::execution::{SimulationParams, Sizing};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_SYMBOL: &str = "BTC-USD";

/// Where to load bars from and which slice of them to use.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub path: Option<String>,
    pub symbol: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, ScalperError> {
    let defaults = BacktestConfig::default();
    let simulation = SimulationParams {
        initial_cash: read_positive(config, "backtest", "initial_cash", defaults.simulation.initial_cash)?,
        commission_rate: read_rate(config, "commission_rate", defaults.simulation.commission_rate)?,
        slippage_rate: read_rate(config, "slippage_rate", defaults.simulation.slippage_rate)?,
        sizing: read_sizing(config)?,
    };
    let bars_per_year = read_bars_per_year(config, defaults.bars_per_year)?;
    let parallel = config.get_bool("backtest", "parallel", defaults.parallel);

    Ok(BacktestConfig {
        simulation,
        bars_per_year,
        parallel,
    })
}

pub fn build_criteria(config: &dyn ConfigPort) -> Result<ProfitabilityCriteria, ScalperError> {
    let defaults = ProfitabilityCriteria::default();
    let min_return = read_f64(config, "criteria", "min_return", defaults.min_return)?;
    let min_sharpe = read_f64(config, "criteria", "min_sharpe", defaults.min_sharpe)?;

    let max_drawdown_limit = read_f64(config, "criteria", "max_drawdown", defaults.max_drawdown_limit)?;
    if !(0.0..=1.0).contains(&max_drawdown_limit) {
        return Err(invalid(
            "criteria",
            "max_drawdown",
            "max_drawdown must be between 0 and 1",
        ));
    }

    let min_trades = config.get_int("criteria", "min_trades", defaults.min_trades as i64);
    if min_trades < 0 {
        return Err(invalid(
            "criteria",
            "min_trades",
            "min_trades must be non-negative",
        ));
    }

    Ok(ProfitabilityCriteria {
        min_return,
        min_sharpe,
        max_drawdown_limit,
        min_trades: min_trades as usize,
    })
}

pub fn build_data_settings(config: &dyn ConfigPort) -> Result<DataSettings, ScalperError> {
    let (start_date, end_date) = validate_dates(config)?;
    let symbol = match config.get_string("data", "symbol") {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        Some(_) => return Err(invalid("data", "symbol", "symbol must not be empty")),
        None => DEFAULT_SYMBOL.to_string(),
    };
    let path = config
        .get_string("data", "path")
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    Ok(DataSettings {
        path,
        symbol,
        start_date,
        end_date,
    })
}

fn validate_dates(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ScalperError> {
    let start = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok((start, end))
}

/// Dates are optional; blank values count as absent.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ScalperError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ScalperError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }),
    }
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ScalperError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(section, key, &format!("{} must be a number", key))),
    }
}

fn read_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ScalperError> {
    let value = read_f64(config, section, key, default)?;
    if value <= 0.0 {
        return Err(invalid(section, key, &format!("{} must be positive", key)));
    }
    Ok(value)
}

fn read_rate(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, ScalperError> {
    let value = read_f64(config, "backtest", key, default)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            key,
            &format!("{} must be in [0, 1)", key),
        ));
    }
    Ok(value)
}

fn read_sizing(config: &dyn ConfigPort) -> Result<Sizing, ScalperError> {
    match config.get_string("backtest", "sizing") {
        None => Ok(Sizing::default()),
        Some(s) => Sizing::parse(&s).ok_or_else(|| {
            invalid(
                "backtest",
                "sizing",
                "sizing must be 'fractional' or 'whole'",
            )
        }),
    }
}

fn read_bars_per_year(config: &dyn ConfigPort, default: u32) -> Result<u32, ScalperError> {
    let value = config.get_int("backtest", "bars_per_year", i64::from(default));
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| {
            invalid(
                "backtest",
                "bars_per_year",
                "bars_per_year must be a positive integer",
            )
        })
}

fn invalid(section: &str, key: &str, reason: &str) -> ScalperError {
    ScalperError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
