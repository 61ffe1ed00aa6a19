// src/main.rs
use clap::Parser;
use env_logger::Builder;
use log::info;
use market_dash::config::{Cli, Command, ServeArgs};
use market_dash::source::{MarketSource, MockMarket};
use market_dash::{api, dashboard};
use std::sync::Arc;

async fn serve(args: ServeArgs) {
    let mut market = MockMarket::new(args.seed);
    if let Some(user_id) = args.user_id {
        market = market.with_user(user_id);
    }
    match args.seed {
        Some(seed) => info!("Generating market data from fixed seed {}", seed),
        None => info!("Generating market data from fresh seeds"),
    }
    let source: Arc<dyn MarketSource> = Arc::new(market);

    let api = api::routes(source);

    info!("Server running on http://{}", args.addr);
    warp::serve(api).run(args.addr).await;
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut logger = Builder::new();
    logger.filter_level(cli.level_filter()).format_timestamp_secs();
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    let command = cli.into_command().unwrap_or_else(|e| e.exit());
    match command {
        Command::Serve(args) => serve(args).await,
        Command::Watch(args) => dashboard::run(args).await,
    }
}
