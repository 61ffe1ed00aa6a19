// src/dashboard.rs
use crate::alerts::AlertFeed;
use crate::config::WatchArgs;
use crate::metrics;
use crate::models::{MarketIndex, MarketSnapshot, PerformanceMetrics, PerformancePeriod, Portfolio};
use crate::poller::{HttpFetcher, PollState, Poller, PollerConfig, Status, MIN_UPDATE_INTERVAL};
use chrono::Utc;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use std::sync::Arc;
use tokio::time;

/// Latest data from each poller, as far as the overview needs it.
#[derive(Debug, Default)]
pub struct Dashboard {
    market: Option<Vec<MarketSnapshot>>,
    portfolio: Option<Portfolio>,
}

impl Dashboard {
    pub fn update_market(&mut self, market: Vec<MarketSnapshot>) {
        self.market = Some(market);
    }

    pub fn update_portfolio(&mut self, portfolio: Portfolio) {
        self.portfolio = Some(portfolio);
    }

    /// Needs both datasets; market data may be empty.
    pub fn overview(&self) -> Option<metrics::OverviewMetrics> {
        let portfolio = self.portfolio.as_ref()?;
        let market = self.market.as_deref()?;
        Some(metrics::overview(portfolio, market))
    }
}

/// Logs failures and returns the data of a freshly connected state.
fn settled<T: Clone>(name: &str, state: &PollState<T>) -> Option<T> {
    match state.status {
        Status::Connected => state.data.clone(),
        Status::Error => {
            warn!(
                "{}: {} (showing data from {:?})",
                name,
                state.error.as_deref().unwrap_or("unknown error"),
                state.last_update
            );
            None
        }
        Status::Idle | Status::Loading => None,
    }
}

fn report_overview(dashboard: &Dashboard) {
    if let Some(overview) = dashboard.overview() {
        info!(
            "Portfolio {:.2} ({:+.2}, {:+.2}%) | {} positions | market cap {} | avg change {:+.2}%",
            overview.total_portfolio_value,
            overview.daily_pnl,
            overview.daily_pnl_percent,
            overview.active_positions,
            overview.total_market_cap,
            overview.average_change_percent
        );
    }
}

/// Returns per period, e.g. `1D +0.42% | 1W -1.10% | ...`.
fn performance_summary(performance: &PerformanceMetrics) -> String {
    PerformancePeriod::ALL
        .iter()
        .map(|&period| format!("{} {:+.2}%", period.label(), performance.get(period)))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub async fn run(args: WatchArgs) {
    let client = Client::new();
    let symbols = args.normalized_symbols();
    let fetcher = |path: &str| {
        let fetcher = HttpFetcher::new(client.clone(), &args.base_url, path);
        info!("Polling {}", fetcher.url());
        Arc::new(fetcher)
    };

    let mut market: Poller<Vec<MarketSnapshot>> = Poller::new(
        PollerConfig {
            name: "market-data".to_string(),
            update_interval: args.market_interval(),
            symbols: symbols.clone(),
            validate: args.validate,
            ..PollerConfig::default()
        },
        fetcher("market-data"),
    );
    let mut portfolio: Poller<Portfolio> = Poller::new(
        PollerConfig {
            name: "portfolio".to_string(),
            update_interval: args.portfolio_interval(),
            validate: args.validate,
            ..PollerConfig::default()
        },
        fetcher("portfolio"),
    );
    let mut indices: Poller<Vec<MarketIndex>> = Poller::new(
        PollerConfig {
            name: "market-indices".to_string(),
            update_interval: args.indices_interval(),
            validate: args.validate,
            ..PollerConfig::default()
        },
        fetcher("market-indices"),
    );

    let mut market_rx = market.subscribe();
    let mut portfolio_rx = portfolio.subscribe();
    let mut indices_rx = indices.subscribe();
    market.start();
    portfolio.start();
    indices.start();

    let mut dashboard = Dashboard::default();
    let mut feed = AlertFeed::new();
    let mut rng = StdRng::from_entropy();
    let mut alert_ticker = time::interval(args.alert_interval().max(MIN_UPDATE_INTERVAL));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = market_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = market_rx.borrow_and_update().clone();
                if let Some(data) = settled("market-data", &state) {
                    let breadth = metrics::breadth(&data);
                    info!(
                        "{} quotes: {} up, {} down, {} flat",
                        data.len(),
                        breadth.advancers,
                        breadth.decliners,
                        breadth.unchanged
                    );
                    dashboard.update_market(data);
                    report_overview(&dashboard);
                }
            }
            changed = portfolio_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = portfolio_rx.borrow_and_update().clone();
                if let Some(data) = settled("portfolio", &state) {
                    if let Some(top) = metrics::allocation(&data).first() {
                        info!("Largest holding {} at {:.2}%", top.symbol, top.weight_percent);
                    }
                    info!("Performance {}", performance_summary(&data.performance));
                    dashboard.update_portfolio(data);
                    report_overview(&dashboard);
                }
            }
            changed = indices_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = indices_rx.borrow_and_update().clone();
                for index in settled("market-indices", &state).unwrap_or_default() {
                    info!(
                        "{} {:.2} ({:+.2}%)",
                        index.name, index.value, index.change_percent
                    );
                }
            }
            _ = alert_ticker.tick() => {
                if let Some(alert) = feed.tick(&mut rng, Utc::now()) {
                    info!("[{:?}/{:?}] {}", alert.kind, alert.severity, alert.message);
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down watcher");
                break;
            }
        }
    }

    market.stop();
    portfolio.stop();
    indices.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator;

    #[test]
    fn overview_waits_for_both_datasets() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut dashboard = Dashboard::default();
        assert!(dashboard.overview().is_none());

        dashboard.update_market(Vec::new());
        assert!(dashboard.overview().is_none());

        dashboard.update_portfolio(generator::portfolio(&mut rng, "u", Utc::now()));
        let overview = dashboard.overview().expect("both datasets present");
        assert_eq!(overview.average_change_percent, 0.0);
        assert_eq!(overview.active_positions, 8);
    }

    #[test]
    fn performance_summary_lists_every_period_in_order() {
        let mut performance = PerformanceMetrics::default();
        performance.set(PerformancePeriod::OneDay, 0.42);
        performance.set(PerformancePeriod::OneYear, -12.5);
        assert_eq!(
            performance_summary(&performance),
            "1D +0.42% | 1W +0.00% | 1M +0.00% | 3M +0.00% | 6M +0.00% | 1Y -12.50%"
        );
    }

    #[test]
    fn only_connected_states_yield_data() {
        let mut state: PollState<Vec<u8>> = PollState::default();
        state.data = Some(vec![1]);
        state.status = Status::Loading;
        assert!(settled("t", &state).is_none());
        state.status = Status::Error;
        state.error = Some("down".into());
        assert!(settled("t", &state).is_none());
        state.status = Status::Connected;
        assert_eq!(settled("t", &state), Some(vec![1]));
    }
}
