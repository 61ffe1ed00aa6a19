// src/metrics.rs
use crate::models::{round2, MarketSnapshot, Portfolio};
use serde::Serialize;

/// Headline figures for the overview page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    pub total_portfolio_value: f64,
    #[serde(rename = "dailyPnL")]
    pub daily_pnl: f64,
    #[serde(rename = "dailyPnLPercent")]
    pub daily_pnl_percent: f64,
    pub total_market_cap: u64,
    pub average_change_percent: f64,
    pub active_positions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub symbol: String,
    pub value: f64,
    pub weight_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarketBreadth {
    pub advancers: usize,
    pub decliners: usize,
    pub unchanged: usize,
}

/// Mean `changePercent`; 0 for an empty market.
pub fn average_change_percent(market: &[MarketSnapshot]) -> f64 {
    if market.is_empty() {
        return 0.0;
    }
    let sum: f64 = market.iter().map(|s| s.change_percent).sum();
    sum / market.len() as f64
}

pub fn overview(portfolio: &Portfolio, market: &[MarketSnapshot]) -> OverviewMetrics {
    OverviewMetrics {
        total_portfolio_value: portfolio.total_value,
        daily_pnl: portfolio.daily_pnl,
        daily_pnl_percent: portfolio.daily_pnl_percent,
        total_market_cap: market.iter().map(|s| s.market_cap).sum(),
        average_change_percent: round2(average_change_percent(market)),
        active_positions: portfolio.positions.len(),
    }
}

/// Share of portfolio value held in each position, largest first.
pub fn allocation(portfolio: &Portfolio) -> Vec<AllocationSlice> {
    let total: f64 = portfolio.positions.iter().map(|p| p.total_value).sum();
    let mut slices: Vec<AllocationSlice> = portfolio
        .positions
        .iter()
        .map(|p| AllocationSlice {
            symbol: p.symbol.clone(),
            value: p.total_value,
            weight_percent: if total > 0.0 {
                round2(p.total_value / total * 100.0)
            } else {
                0.0
            },
        })
        .collect();
    slices.sort_by(|a, b| b.value.total_cmp(&a.value));
    slices
}

pub fn breadth(market: &[MarketSnapshot]) -> MarketBreadth {
    market
        .iter()
        .fold(MarketBreadth::default(), |mut acc, snapshot| {
            if snapshot.change > 0.0 {
                acc.advancers += 1;
            } else if snapshot.change < 0.0 {
                acc.decliners += 1;
            } else {
                acc.unchanged += 1;
            }
            acc
        })
}
