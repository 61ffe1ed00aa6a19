// src/config.rs
use clap::{Args, FromArgMatches, Parser, Subcommand};
use log::LevelFilter;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "market_dash", about = "Mock market data server and polling dashboard")]
pub struct Cli {
    /// off, error, warn, info, debug or trace
    #[arg(long, global = true, env = "MARKET_DASH_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the mock market API
    Serve(ServeArgs),
    /// Poll a running server and log dashboard updates
    Watch(WatchArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, env = "MARKET_DASH_ADDR", default_value = "127.0.0.1:3030")]
    pub addr: SocketAddr,

    /// Fixed seed; every response is then identical apart from timestamps
    #[arg(long, env = "MARKET_DASH_SEED")]
    pub seed: Option<u64>,

    #[arg(long, env = "MARKET_DASH_USER")]
    pub user_id: Option<String>,
}

impl Cli {
    /// Unknown level names fall back to `info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// The subcommand to run. A bare invocation serves, with its settings
    /// read from the environment the same way `serve` reads them.
    pub fn into_command(self) -> Result<Command, clap::Error> {
        match self.command {
            Some(command) => Ok(command),
            None => {
                let matches = ServeArgs::augment_args(clap::Command::new("serve"))
                    .try_get_matches_from(["serve"])?;
                Ok(Command::Serve(ServeArgs::from_arg_matches(&matches)?))
            }
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    #[arg(long, env = "MARKET_DASH_URL", default_value = "http://127.0.0.1:3030")]
    pub base_url: String,

    /// Comma separated allow-list applied to market data and positions
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1..))]
    pub market_interval_ms: u64,

    #[arg(long, default_value_t = 30000, value_parser = clap::value_parser!(u64).range(1..))]
    pub portfolio_interval_ms: u64,

    #[arg(long, default_value_t = 30000, value_parser = clap::value_parser!(u64).range(1..))]
    pub indices_interval_ms: u64,

    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1..))]
    pub alert_interval_ms: u64,

    /// Check payloads against the schema rules before publishing them
    #[arg(long)]
    pub validate: bool,
}

impl WatchArgs {
    pub fn market_interval(&self) -> Duration {
        Duration::from_millis(self.market_interval_ms)
    }

    pub fn portfolio_interval(&self) -> Duration {
        Duration::from_millis(self.portfolio_interval_ms)
    }

    pub fn indices_interval(&self) -> Duration {
        Duration::from_millis(self.indices_interval_ms)
    }

    pub fn alert_interval(&self) -> Duration {
        Duration::from_millis(self.alert_interval_ms)
    }

    pub fn normalized_symbols(&self) -> Vec<String> {
        self.symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
