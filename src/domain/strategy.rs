//! Strategy parameter sets handed to signal sources.

use std::collections::BTreeMap;
use std::fmt;

use super::error::ScalperError;

/// One named parameter configuration of a strategy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrategyConfig {
    pub name: String,
    pub params: BTreeMap<String, f64>,
}

impl StrategyConfig {
    pub fn new(name: impl Into<String>) -> Self {
        StrategyConfig {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    /// Required parameter, or a signal generation error naming it.
    pub fn require(&self, key: &str) -> Result<f64, ScalperError> {
        self.get(key).ok_or_else(|| ScalperError::SignalGeneration {
            reason: format!("{}: missing parameter '{}'", self.name, key),
        })
    }

    /// Required parameter that must be a positive whole number (a window length).
    pub fn require_period(&self, key: &str) -> Result<usize, ScalperError> {
        let value = self.require(key)?;
        if value < 1.0 || value.fract() != 0.0 {
            return Err(ScalperError::SignalGeneration {
                reason: format!(
                    "{}: parameter '{}' must be a positive integer, got {}",
                    self.name, key, value
                ),
            });
        }
        Ok(value as usize)
    }

    /// Short label such as `sma(long=30, short=10)`.
    pub fn label(&self) -> String {
        if self.params.is_empty() {
            return self.name.clone();
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Parse `key=value` pairs as given on the command line.
pub fn parse_param(pair: &str) -> Result<(String, f64), ScalperError> {
    let invalid = |reason: &str| ScalperError::ConfigInvalid {
        section: "strategy".to_string(),
        key: pair.to_string(),
        reason: reason.to_string(),
    };
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| invalid("expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid("empty parameter name"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid("value must be numeric"))?;
    Ok((key.to_string(), value))
}
