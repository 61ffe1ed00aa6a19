// src/source.rs
use crate::error::GenerationError;
use crate::generator;
use crate::models::{HistoricalBar, MarketIndex, MarketSector, MarketSnapshot, Portfolio};
use crate::schema::Validate;
use chrono::Utc;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Where the boundary handlers get their data from.
pub trait MarketSource: Send + Sync {
    fn market_data(&self) -> Result<Vec<MarketSnapshot>, GenerationError>;
    fn market_indices(&self) -> Result<Vec<MarketIndex>, GenerationError>;
    fn market_sectors(&self) -> Result<Vec<MarketSector>, GenerationError>;
    fn portfolio(&self) -> Result<Portfolio, GenerationError>;
    fn historical(&self, symbol: &str, days: i64) -> Result<Vec<HistoricalBar>, GenerationError>;
}

/// Random data with no backing store. With a fixed seed every call returns
/// the same numbers; otherwise each call draws a fresh seed.
#[derive(Debug, Clone, Default)]
pub struct MockMarket {
    seed: Option<u64>,
    user_id: Option<String>,
}

impl MockMarket {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn checked<T: Validate>(entity: &'static str, value: T) -> Result<T, GenerationError> {
    value
        .validate()
        .map_err(|reason| GenerationError::Inconsistent { entity, reason })?;
    Ok(value)
}

impl MarketSource for MockMarket {
    fn market_data(&self) -> Result<Vec<MarketSnapshot>, GenerationError> {
        let data = generator::market_data(&mut self.rng(), Utc::now());
        debug!("Generated {} market snapshots", data.len());
        checked("market data", data)
    }

    fn market_indices(&self) -> Result<Vec<MarketIndex>, GenerationError> {
        checked(
            "market indices",
            generator::market_indices(&mut self.rng(), Utc::now()),
        )
    }

    fn market_sectors(&self) -> Result<Vec<MarketSector>, GenerationError> {
        checked("market sectors", generator::market_sectors(&mut self.rng()))
    }

    fn portfolio(&self) -> Result<Portfolio, GenerationError> {
        let user_id = self
            .user_id
            .as_deref()
            .unwrap_or(generator::DEFAULT_USER_ID);
        checked(
            "portfolio",
            generator::portfolio(&mut self.rng(), user_id, Utc::now()),
        )
    }

    fn historical(&self, symbol: &str, days: i64) -> Result<Vec<HistoricalBar>, GenerationError> {
        let bars = generator::historical(&mut self.rng(), symbol, days, Utc::now());
        debug!("Generated {} bars for {}", bars.len(), symbol);
        checked("historical data", bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_market_is_reproducible() {
        let market = MockMarket::new(Some(9));
        let a = market.portfolio().unwrap();
        let b = market.portfolio().unwrap();
        assert_eq!(a.positions.len(), b.positions.len());
        assert_eq!(a.total_value, b.total_value);
    }

    #[test]
    fn user_id_is_configurable() {
        let market = MockMarket::new(None).with_user("someone");
        assert_eq!(market.portfolio().unwrap().user_id, "someone");
    }

    #[test]
    fn unknown_symbols_are_echoed() {
        let bars = MockMarket::new(Some(1)).historical("NOPE", 2).unwrap();
        assert_eq!(bars.len(), 3);
        assert!(bars.iter().all(|b| b.symbol == "NOPE"));
    }
}
