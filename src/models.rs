// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "high24h", default, skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<f64>,
    #[serde(rename = "low24h", default, skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    pub id: String,
    pub symbol: String,
    pub shares: u32,
    pub avg_price: f64,
    pub current_price: f64,
    pub total_value: f64,
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: f64,
    #[serde(rename = "unrealizedPnLPercent")]
    pub unrealized_pnl_percent: f64,
    pub purchase_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// The fixed look-back windows a portfolio reports performance over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformancePeriod {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl PerformancePeriod {
    pub const ALL: [PerformancePeriod; 6] = [
        PerformancePeriod::OneDay,
        PerformancePeriod::OneWeek,
        PerformancePeriod::OneMonth,
        PerformancePeriod::ThreeMonths,
        PerformancePeriod::SixMonths,
        PerformancePeriod::OneYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PerformancePeriod::OneDay => "1D",
            PerformancePeriod::OneWeek => "1W",
            PerformancePeriod::OneMonth => "1M",
            PerformancePeriod::ThreeMonths => "3M",
            PerformancePeriod::SixMonths => "6M",
            PerformancePeriod::OneYear => "1Y",
        }
    }
}

/// Percentage return per [`PerformancePeriod`]. One field per period so the
/// compiler flags every `get`/`set` when a period is added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(rename = "1D")]
    pub one_day: f64,
    #[serde(rename = "1W")]
    pub one_week: f64,
    #[serde(rename = "1M")]
    pub one_month: f64,
    #[serde(rename = "3M")]
    pub three_months: f64,
    #[serde(rename = "6M")]
    pub six_months: f64,
    #[serde(rename = "1Y")]
    pub one_year: f64,
}

impl PerformanceMetrics {
    pub fn get(&self, period: PerformancePeriod) -> f64 {
        match period {
            PerformancePeriod::OneDay => self.one_day,
            PerformancePeriod::OneWeek => self.one_week,
            PerformancePeriod::OneMonth => self.one_month,
            PerformancePeriod::ThreeMonths => self.three_months,
            PerformancePeriod::SixMonths => self.six_months,
            PerformancePeriod::OneYear => self.one_year,
        }
    }

    pub fn set(&mut self, period: PerformancePeriod, value: f64) {
        let slot = match period {
            PerformancePeriod::OneDay => &mut self.one_day,
            PerformancePeriod::OneWeek => &mut self.one_week,
            PerformancePeriod::OneMonth => &mut self.one_month,
            PerformancePeriod::ThreeMonths => &mut self.three_months,
            PerformancePeriod::SixMonths => &mut self.six_months,
            PerformancePeriod::OneYear => &mut self.one_year,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub user_id: String,
    pub total_value: f64,
    #[serde(rename = "dailyPnL")]
    pub daily_pnl: f64,
    #[serde(rename = "dailyPnLPercent")]
    pub daily_pnl_percent: f64,
    pub positions: Vec<PortfolioPosition>,
    pub performance: PerformanceMetrics,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalBar {
    pub symbol: String,
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_close: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    pub name: String,
    pub symbol: String,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSector {
    pub name: String,
    pub performance: f64,
    pub market_cap: u64,
    pub top_stocks: Vec<String>,
}

/// Anything carrying a ticker symbol, so pollers can apply an allow-list.
pub trait Symbolic {
    fn symbol(&self) -> &str;
}

impl Symbolic for MarketSnapshot {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Symbolic for MarketIndex {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Symbolic for HistoricalBar {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Symbolic for PortfolioPosition {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// Rounds to cents, the precision every generated figure is published at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
