// src/generator.rs
//! Synthetic market data. Every function takes the random source and the
//! current time from the caller so one call reads one seeded `Rng` and the
//! clock exactly once.
use crate::models::{
    round2, HistoricalBar, MarketIndex, MarketSector, MarketSnapshot, PerformanceMetrics,
    PerformancePeriod, Portfolio, PortfolioPosition,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const STOCK_SYMBOLS: [&str; 16] = [
    "AAPL", "GOOGL", "MSFT", "TSLA", "AMZN", "META", "NVDA", "NFLX", "AMD", "INTC", "CRM", "ORCL",
    "ADBE", "PYPL", "UBER", "SPOT",
];

pub const MARKET_SECTORS: [&str; 11] = [
    "Technology",
    "Healthcare",
    "Financial Services",
    "Consumer Cyclical",
    "Communication Services",
    "Industrials",
    "Consumer Defensive",
    "Energy",
    "Utilities",
    "Real Estate",
    "Basic Materials",
];

/// (name, symbol, base value)
pub const MARKET_INDICES: [(&str, &str, f64); 4] = [
    ("S&P 500", "SPX", 4500.0),
    ("NASDAQ", "IXIC", 14000.0),
    ("Dow Jones", "DJI", 35000.0),
    ("Russell 2000", "RUT", 2000.0),
];

pub const PORTFOLIO_POSITIONS: usize = 8;
pub const DEFAULT_USER_ID: &str = "user-123";

/// Centred uniform draw in `[-width/2, width/2)`.
fn spread<R: Rng>(rng: &mut R, width: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * width
}

pub fn market_data<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> Vec<MarketSnapshot> {
    STOCK_SYMBOLS
        .iter()
        .map(|symbol| {
            let base = rng.gen_range(50.0..850.0);
            let change = spread(rng, 20.0);
            MarketSnapshot {
                symbol: symbol.to_string(),
                price: round2(base),
                change: round2(change),
                change_percent: round2(change / base * 100.0),
                volume: rng.gen_range(1_000_000..51_000_000),
                market_cap: rng.gen_range(10_000_000_000..2_010_000_000_000),
                timestamp: now,
                high_24h: Some(round2(base + rng.gen::<f64>() * 10.0)),
                low_24h: Some(round2(base - rng.gen::<f64>() * 10.0)),
                open_price: Some(round2(base + spread(rng, 5.0))),
                close_price: Some(round2(base + spread(rng, 3.0))),
            }
        })
        .collect()
}

fn performance<R: Rng>(rng: &mut R) -> PerformanceMetrics {
    let mut metrics = PerformanceMetrics::default();
    for period in PerformancePeriod::ALL {
        let swing = match period {
            PerformancePeriod::OneDay => 3.0,
            PerformancePeriod::OneWeek => 5.0,
            PerformancePeriod::OneMonth => 10.0,
            PerformancePeriod::ThreeMonths => 15.0,
            PerformancePeriod::SixMonths => 20.0,
            PerformancePeriod::OneYear => 30.0,
        };
        metrics.set(period, round2(spread(rng, swing * 2.0)));
    }
    metrics
}

pub fn portfolio<R: Rng>(rng: &mut R, user_id: &str, now: DateTime<Utc>) -> Portfolio {
    let positions: Vec<PortfolioPosition> = STOCK_SYMBOLS[..PORTFOLIO_POSITIONS]
        .iter()
        .enumerate()
        .map(|(index, symbol)| {
            let shares: u32 = rng.gen_range(10..1010);
            let avg_price = round2(rng.gen_range(50.0..250.0));
            let current_price = round2(avg_price + spread(rng, 50.0));
            let cost = shares as f64 * avg_price;
            let unrealized_pnl = shares as f64 * (current_price - avg_price);
            let held_for = Duration::seconds(rng.gen_range(0..365 * 24 * 60 * 60));
            PortfolioPosition {
                id: format!("position-{}", index + 1),
                symbol: symbol.to_string(),
                shares,
                avg_price,
                current_price,
                total_value: round2(shares as f64 * current_price),
                unrealized_pnl: round2(unrealized_pnl),
                unrealized_pnl_percent: round2(unrealized_pnl / cost * 100.0),
                purchase_date: now - held_for,
                last_updated: now,
            }
        })
        .collect();

    let total_value: f64 = positions.iter().map(|p| p.total_value).sum();
    let total_pnl: f64 = positions.iter().map(|p| p.unrealized_pnl).sum();
    let daily_pnl_percent = if total_value > 0.0 {
        total_pnl / total_value * 100.0
    } else {
        0.0
    };

    Portfolio {
        id: "portfolio-1".to_string(),
        user_id: user_id.to_string(),
        total_value: round2(total_value),
        daily_pnl: round2(total_pnl),
        daily_pnl_percent: round2(daily_pnl_percent),
        positions,
        performance: performance(rng),
        last_updated: now,
    }
}

/// Bars for `days` days back up to and including today, oldest first.
/// Negative ranges produce no bars.
pub fn historical<R: Rng>(
    rng: &mut R,
    symbol: &str,
    days: i64,
    now: DateTime<Utc>,
) -> Vec<HistoricalBar> {
    if days < 0 {
        return Vec::new();
    }
    let base = rng.gen_range(50.0..250.0);
    (0..=days)
        .rev()
        .map(|offset| {
            let open = round2(base + spread(rng, 20.0));
            let close = round2(open + spread(rng, 10.0));
            let high = round2(open.max(close) + rng.gen::<f64>() * 5.0);
            let low = round2(open.min(close) - rng.gen::<f64>() * 5.0);
            HistoricalBar {
                symbol: symbol.to_string(),
                date: now - Duration::days(offset),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(1_000_000..11_000_000),
                adjusted_close: Some(close),
            }
        })
        .collect()
}

pub fn market_indices<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> Vec<MarketIndex> {
    MARKET_INDICES
        .iter()
        .map(|(name, symbol, base)| {
            let change = spread(rng, 200.0);
            MarketIndex {
                name: name.to_string(),
                symbol: symbol.to_string(),
                value: round2(base + change),
                change: round2(change),
                change_percent: round2(change / base * 100.0),
                timestamp: now,
            }
        })
        .collect()
}

pub fn market_sectors<R: Rng>(rng: &mut R) -> Vec<MarketSector> {
    MARKET_SECTORS
        .iter()
        .map(|name| MarketSector {
            name: name.to_string(),
            performance: round2(spread(rng, 10.0)),
            market_cap: rng.gen_range(100_000_000_000..5_100_000_000_000),
            top_stocks: STOCK_SYMBOLS[..3].iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}
