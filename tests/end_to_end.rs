use market_dash::api;
use market_dash::metrics;
use market_dash::models::{HistoricalBar, MarketSnapshot, Portfolio};
use market_dash::poller::{Fetch, HttpFetcher, Poller, PollerConfig, Status};
use market_dash::source::{MarketSource, MockMarket};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;

fn spawn_server() -> String {
    let source: Arc<dyn MarketSource> = Arc::new(MockMarket::new(Some(21)));
    let (addr, server) =
        warp::serve(api::routes(source)).bind_ephemeral(SocketAddr::from(([127, 0, 0, 1], 0)));
    tokio::spawn(server);
    format!("http://{}", addr)
}

fn manual(name: &str, symbols: Vec<String>) -> PollerConfig {
    PollerConfig {
        name: name.to_string(),
        auto_refresh: false,
        symbols,
        validate: true,
        ..PollerConfig::default()
    }
}

#[tokio::test]
async fn pollers_feed_the_overview() {
    let base = spawn_server();
    let client = Client::new();

    let market: Poller<Vec<MarketSnapshot>> = Poller::new(
        manual("market-data", vec!["AAPL".into(), "NVDA".into()]),
        Arc::new(HttpFetcher::new(client.clone(), &base, "market-data")),
    );
    let portfolio: Poller<Portfolio> = Poller::new(
        manual("portfolio", Vec::new()),
        Arc::new(HttpFetcher::new(client, &base, "portfolio")),
    );

    market.refresh().await;
    portfolio.refresh().await;

    let market_state = market.state();
    assert_eq!(market_state.status, Status::Connected, "{:?}", market_state.error);
    let quotes = market_state.data.unwrap();
    assert_eq!(
        quotes.iter().map(|q| q.symbol.as_str()).collect::<Vec<_>>(),
        ["AAPL", "NVDA"]
    );

    let holdings = portfolio.state().data.expect("portfolio loaded");
    let overview = metrics::overview(&holdings, &quotes);
    assert_eq!(overview.active_positions, 8);
    assert_eq!(overview.total_portfolio_value, holdings.total_value);
}

#[tokio::test]
async fn rejected_requests_surface_the_server_message() {
    let base = spawn_server();
    let fetcher = HttpFetcher::new(Client::new(), &base, "historical/");
    let result = <HttpFetcher as Fetch<Vec<HistoricalBar>>>::fetch(&fetcher).await;
    let err = result.expect_err("missing symbol is rejected");
    assert_eq!(err.to_string(), "Symbol parameter is required");
}

#[tokio::test]
async fn unreachable_server_disconnects_the_poller() {
    let poller: Poller<Vec<MarketSnapshot>> = Poller::new(
        manual("market-data", Vec::new()),
        Arc::new(HttpFetcher::new(
            Client::new(),
            "http://127.0.0.1:9",
            "market-data",
        )),
    );
    poller.refresh().await;
    let state = poller.state();
    assert_eq!(state.status, Status::Error);
    assert!(!state.is_connected);
    assert!(state.data.is_none());
    assert!(state.error.is_some());
}
