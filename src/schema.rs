// src/schema.rs
//! Payload validation rules. The generator output is checked against these
//! before it leaves the server, and pollers can opt into checking what they
//! receive before publishing it.
use crate::models::{
    HistoricalBar, MarketIndex, MarketSector, MarketSnapshot, Portfolio, PortfolioPosition,
};

const MAX_SYMBOL_LEN: usize = 10;
const TOTAL_TOLERANCE: f64 = 0.011;

pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter().try_for_each(Validate::validate)
    }
}

fn symbol(value: &str) -> Result<(), String> {
    if value.is_empty() || value.len() > MAX_SYMBOL_LEN {
        return Err(format!("symbol {:?} must be 1-{} characters", value, MAX_SYMBOL_LEN));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be positive, got {}", field, value))
    }
}

fn finite(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{} must be finite", field))
    }
}

impl Validate for MarketSnapshot {
    fn validate(&self) -> Result<(), String> {
        symbol(&self.symbol)?;
        positive("price", self.price)?;
        finite("change", self.change)?;
        finite("changePercent", self.change_percent)?;
        if self.market_cap == 0 {
            return Err(format!("{}: marketCap must be positive", self.symbol));
        }
        for (field, value) in [
            ("high24h", self.high_24h),
            ("low24h", self.low_24h),
            ("openPrice", self.open_price),
            ("closePrice", self.close_price),
        ] {
            if let Some(v) = value {
                positive(field, v)?;
            }
        }
        if let (Some(high), Some(low)) = (self.high_24h, self.low_24h) {
            if !(low <= self.price && self.price <= high) {
                return Err(format!(
                    "{}: price {} outside 24h range [{}, {}]",
                    self.symbol, self.price, low, high
                ));
            }
        }
        Ok(())
    }
}

impl Validate for PortfolioPosition {
    fn validate(&self) -> Result<(), String> {
        symbol(&self.symbol)?;
        if self.shares == 0 {
            return Err(format!("{}: shares must be positive", self.id));
        }
        positive("avgPrice", self.avg_price)?;
        positive("currentPrice", self.current_price)?;
        let expected = self.shares as f64 * self.current_price;
        if (expected - self.total_value).abs() > TOTAL_TOLERANCE {
            return Err(format!(
                "{}: totalValue {} != shares x currentPrice {}",
                self.id, self.total_value, expected
            ));
        }
        Ok(())
    }
}

impl Validate for Portfolio {
    fn validate(&self) -> Result<(), String> {
        self.positions.validate()?;
        let mut ids: Vec<&str> = self.positions.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err("position ids must be unique".to_string());
        }
        let total: f64 = self.positions.iter().map(|p| p.total_value).sum();
        if (total - self.total_value).abs() > TOTAL_TOLERANCE {
            return Err(format!(
                "totalValue {} != sum of positions {}",
                self.total_value, total
            ));
        }
        let pnl: f64 = self.positions.iter().map(|p| p.unrealized_pnl).sum();
        if (pnl - self.daily_pnl).abs() > TOTAL_TOLERANCE {
            return Err(format!("dailyPnL {} != sum of positions {}", self.daily_pnl, pnl));
        }
        Ok(())
    }
}

impl Validate for HistoricalBar {
    fn validate(&self) -> Result<(), String> {
        symbol(&self.symbol)?;
        positive("open", self.open)?;
        positive("high", self.high)?;
        positive("low", self.low)?;
        positive("close", self.close)?;
        if self.high < self.open.max(self.close) || self.low > self.open.min(self.close) {
            return Err(format!("{} {}: OHLC out of order", self.symbol, self.date));
        }
        Ok(())
    }
}

impl Validate for MarketIndex {
    fn validate(&self) -> Result<(), String> {
        symbol(&self.symbol)?;
        positive("value", self.value)?;
        finite("changePercent", self.change_percent)
    }
}

impl Validate for MarketSector {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("sector name must not be empty".to_string());
        }
        if self.market_cap == 0 {
            return Err(format!("{}: marketCap must be positive", self.name));
        }
        self.top_stocks.iter().try_for_each(|s| symbol(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> HistoricalBar {
        HistoricalBar {
            symbol: "AAPL".into(),
            date: Utc::now(),
            open,
            high,
            low,
            close,
            volume: 1,
            adjusted_close: Some(close),
        }
    }

    #[test]
    fn rejects_bar_with_high_below_close() {
        assert!(bar(10.0, 11.0, 9.0, 10.5).validate().is_ok());
        assert!(bar(10.0, 10.2, 9.0, 10.5).validate().is_err());
        assert!(bar(10.0, 11.0, 10.1, 10.5).validate().is_err());
    }

    #[test]
    fn rejects_bad_symbols() {
        let mut b = bar(1.0, 1.0, 1.0, 1.0);
        b.symbol = String::new();
        assert!(b.validate().is_err());
        b.symbol = "WAYTOOLONGSYM".into();
        assert!(b.validate().is_err());
    }

    #[test]
    fn portfolio_totals_must_match_positions() {
        let now = Utc::now();
        let position = PortfolioPosition {
            id: "position-1".into(),
            symbol: "AAPL".into(),
            shares: 10,
            avg_price: 100.0,
            current_price: 110.0,
            total_value: 1100.0,
            unrealized_pnl: 100.0,
            unrealized_pnl_percent: 10.0,
            purchase_date: now,
            last_updated: now,
        };
        let mut portfolio = Portfolio {
            id: "portfolio-1".into(),
            user_id: "user-123".into(),
            total_value: 1100.0,
            daily_pnl: 100.0,
            daily_pnl_percent: 9.09,
            positions: vec![position],
            performance: Default::default(),
            last_updated: now,
        };
        assert!(portfolio.validate().is_ok());

        portfolio.total_value = 1200.0;
        assert!(portfolio.validate().is_err());
    }
}
