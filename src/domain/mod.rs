//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod stats;
pub mod backtest;
pub mod metrics;
pub mod evaluation;
pub mod strategy;
pub mod comparison;
pub mod config_validation;
pub mod error;
