//! Profitability thresholds and strategy ranking.

use std::cmp::Ordering;

use super::metrics::MetricsReport;

/// Pass/fail thresholds. All four must hold for a report to pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitabilityCriteria {
    pub min_return: f64,
    pub min_sharpe: f64,
    /// Largest tolerated drawdown as a positive fraction (0.2 = 20%).
    pub max_drawdown_limit: f64,
    pub min_trades: usize,
}

impl Default for ProfitabilityCriteria {
    fn default() -> Self {
        ProfitabilityCriteria {
            min_return: 0.1,
            min_sharpe: 1.0,
            max_drawdown_limit: 0.2,
            min_trades: 5,
        }
    }
}

pub fn meets_criteria(report: &MetricsReport, criteria: &ProfitabilityCriteria) -> bool {
    report.total_return >= criteria.min_return
        && report.sharpe_ratio >= criteria.min_sharpe
        && report.max_drawdown >= -criteria.max_drawdown_limit
        && report.total_trades >= criteria.min_trades
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedReport {
    /// 1-based.
    pub rank: usize,
    /// Index of the report in the input slice.
    pub position: usize,
    pub report: MetricsReport,
}

/// Sharpe desc, then total return desc, then drawdown desc (closest to zero).
pub fn compare_reports(a: &MetricsReport, b: &MetricsReport) -> Ordering {
    b.sharpe_ratio
        .total_cmp(&a.sharpe_ratio)
        .then_with(|| b.total_return.total_cmp(&a.total_return))
        .then_with(|| b.max_drawdown.total_cmp(&a.max_drawdown))
}

/// Input indices in rank order. Full ties keep input order.
pub fn ranking_order(reports: &[&MetricsReport]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..reports.len()).collect();
    order.sort_by(|&a, &b| compare_reports(reports[a], reports[b]));
    order
}

pub fn rank(reports: &[MetricsReport]) -> Vec<RankedReport> {
    let refs: Vec<&MetricsReport> = reports.iter().collect();
    ranking_order(&refs)
        .into_iter()
        .enumerate()
        .map(|(i, position)| RankedReport {
            rank: i + 1,
            position,
            report: reports[position].clone(),
        })
        .collect()
}
