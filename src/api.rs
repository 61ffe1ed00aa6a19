// src/api.rs
use crate::envelope;
use crate::error::{ApiError, GenerationError};
use crate::source::MarketSource;
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

pub const DEFAULT_HISTORY_DAYS: i64 = 30;
pub const MAX_HISTORY_DAYS: i64 = 3650;

pub fn routes(
    source: Arc<dyn MarketSource>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let market_data = warp::path!("market-data")
        .and(warp::get())
        .and(with_source(source.clone()))
        .and_then(market_data_handler);

    let market_indices = warp::path!("market-indices")
        .and(warp::get())
        .and(with_source(source.clone()))
        .and_then(market_indices_handler);

    let market_sectors = warp::path!("market-sectors")
        .and(warp::get())
        .and(with_source(source.clone()))
        .and_then(market_sectors_handler);

    let portfolio = warp::path!("portfolio")
        .and(warp::get())
        .and(with_source(source.clone()))
        .and_then(portfolio_handler);

    let historical = warp::path!("historical" / String)
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_source(source))
        .and_then(historical_handler);

    // `/historical` and `/historical/` carry no symbol segment
    let historical_missing_symbol = warp::path("historical")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(missing_symbol_handler);

    market_data
        .or(market_indices)
        .or(market_sectors)
        .or(portfolio)
        .or(historical)
        .or(historical_missing_symbol)
        .with(warp::log("market_dash::api"))
}

fn with_source(
    source: Arc<dyn MarketSource>,
) -> impl Filter<Extract = (Arc<dyn MarketSource>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || source.clone())
}

/// Logs the underlying fault and replaces it with the endpoint's public message.
fn internal(message: &'static str) -> impl FnOnce(GenerationError) -> ApiError {
    move |e| {
        error!("{}: {}", message, e);
        ApiError::Internal(message.to_string())
    }
}

async fn market_data_handler(source: Arc<dyn MarketSource>) -> Result<impl Reply, Rejection> {
    let result = source
        .market_data()
        .map_err(internal("Failed to fetch market data"));
    Ok(envelope::reply(result))
}

async fn market_indices_handler(source: Arc<dyn MarketSource>) -> Result<impl Reply, Rejection> {
    let result = source
        .market_indices()
        .map_err(internal("Failed to fetch market indices"));
    Ok(envelope::reply(result))
}

async fn market_sectors_handler(source: Arc<dyn MarketSource>) -> Result<impl Reply, Rejection> {
    let result = source
        .market_sectors()
        .map_err(internal("Failed to fetch market sectors"));
    Ok(envelope::reply(result))
}

async fn portfolio_handler(source: Arc<dyn MarketSource>) -> Result<impl Reply, Rejection> {
    let result = source
        .portfolio()
        .map_err(internal("Failed to fetch portfolio data"));
    if let Ok(portfolio) = &result {
        info!(
            "Portfolio for {} valued at {:.2}",
            portfolio.user_id, portfolio.total_value
        );
    }
    Ok(envelope::reply(result))
}

fn parse_days(query: &HashMap<String, String>) -> Result<i64, ApiError> {
    let raw = match query.get("days").map(|d| d.trim()) {
        None | Some("") => return Ok(DEFAULT_HISTORY_DAYS),
        Some(raw) => raw,
    };
    match raw.parse::<i64>() {
        Ok(days) if days <= MAX_HISTORY_DAYS => Ok(days),
        Ok(_) => Err(ApiError::Validation(format!(
            "Days parameter must not exceed {}",
            MAX_HISTORY_DAYS
        ))),
        Err(_) => Err(ApiError::Validation(format!(
            "Days parameter must be an integer, got {:?}",
            raw
        ))),
    }
}

async fn historical_handler(
    symbol: String,
    query: HashMap<String, String>,
    source: Arc<dyn MarketSource>,
) -> Result<impl Reply, Rejection> {
    let symbol = symbol.trim().to_uppercase();
    let result = if symbol.is_empty() {
        Err(ApiError::Validation("Symbol parameter is required".to_string()))
    } else {
        parse_days(&query).and_then(|days| {
            info!("Generating {} days of history for {}", days, symbol);
            source
                .historical(&symbol, days)
                .map_err(internal("Failed to fetch historical data"))
        })
    };
    if let Err(ApiError::Validation(message)) = &result {
        warn!("Rejected historical request: {}", message);
    }
    Ok(envelope::reply(result))
}

async fn missing_symbol_handler() -> Result<impl Reply, Rejection> {
    warn!("Historical request without a symbol");
    Ok(envelope::reply::<Vec<crate::models::HistoricalBar>>(Err(
        ApiError::Validation("Symbol parameter is required".to_string()),
    )))
}
