// src/poller.rs
//! Timer-driven clients that keep the latest copy of one dataset.
//!
//! A [`Poller`] owns one driver task with one interval timer. Every fetch,
//! timer-driven or manual, gets a sequence number; a response older than the
//! last one applied is dropped instead of overwriting newer data. Timer ticks
//! that land while a fetch is still in flight are skipped. State is published
//! through a `watch` channel so any number of readers see the latest
//! [`PollState`].
use crate::envelope::ApiResponse;
use crate::error::ClientError;
use crate::models::{Portfolio, Symbolic};
use crate::schema::Validate;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shortest timer period a poller runs with.
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

/// Source of the `last_update` timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall-clock time derived from tokio's monotonic clock, so it follows
/// `tokio::time::pause`/`advance` and never goes backwards.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    wall: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            wall: Utc::now(),
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.wall + elapsed
    }
}

/// One request for a dataset, answered with the API envelope.
#[async_trait]
pub trait Fetch<T>: Send + Sync {
    async fn fetch(&self) -> Result<ApiResponse<T>, ClientError>;
}

/// GETs one endpoint and decodes the envelope.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(client: Client, base_url: &str, path: &str) -> Self {
        Self {
            client,
            url: format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<T> Fetch<T> for HttpFetcher
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self) -> Result<ApiResponse<T>, ClientError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<ApiResponse<T>>().await?);
        }
        // 4xx/5xx replies still carry an envelope with the reason
        let body = response.bytes().await?;
        match serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body) {
            Ok(ApiResponse {
                error: Some(message),
                ..
            }) => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::Status(status.as_u16())),
        }
    }
}

/// Datasets a poller can hold.
pub trait PollData: Validate + Clone + Send + Sync + 'static {
    /// Keeps only entries whose symbol is in `symbols`.
    fn retain_symbols(&mut self, symbols: &[String]);
}

impl<S> PollData for Vec<S>
where
    S: Symbolic + Validate + Clone + Send + Sync + 'static,
{
    fn retain_symbols(&mut self, symbols: &[String]) {
        self.retain(|item| symbols.iter().any(|s| s == item.symbol()));
    }
}

impl PollData for Portfolio {
    fn retain_symbols(&mut self, symbols: &[String]) {
        self.positions
            .retain(|p| symbols.iter().any(|s| s == p.symbol()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Connected,
    Error,
}

#[derive(Debug, Clone)]
pub struct PollState<T> {
    pub data: Option<T>,
    pub status: Status,
    pub loading: bool,
    pub error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub is_connected: bool,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            data: None,
            status: Status::Idle,
            loading: false,
            error: None,
            last_update: None,
            is_connected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub name: String,
    pub update_interval: Duration,
    pub auto_refresh: bool,
    /// Empty means no filtering.
    pub symbols: Vec<String>,
    pub validate: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            name: "poller".to_string(),
            update_interval: Duration::from_millis(5000),
            auto_refresh: true,
            symbols: Vec::new(),
            validate: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Start,
    Timer,
    Manual,
}

#[derive(Debug)]
enum Command {
    Pause,
    Resume,
}

struct Shared<T> {
    name: String,
    fetcher: Arc<dyn Fetch<T>>,
    clock: Arc<dyn Clock>,
    symbols: Vec<String>,
    validate: bool,
    state: watch::Sender<PollState<T>>,
    next_seq: AtomicU64,
    applied_seq: AtomicU64,
    in_flight: AtomicUsize,
    paused: AtomicBool,
    stopped: AtomicBool,
}

/// Counts one fetch as outstanding until it finishes or its future is
/// dropped.
struct InFlight<'a, T> {
    shared: &'a Shared<T>,
    finished: bool,
}

impl<'a, T> InFlight<'a, T> {
    fn enter(shared: &'a Shared<T>) -> Self {
        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            shared,
            finished: false,
        }
    }

    /// Returns how many fetches are still outstanding.
    fn finish(mut self) -> usize {
        self.finished = true;
        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst) - 1
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let shared = self.shared;
        let remaining = shared.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!("[{}] fetch cancelled", shared.name);
        if remaining > 0 || shared.stopped.load(Ordering::SeqCst) {
            return;
        }
        shared.state.send_if_modified(|s| {
            if !s.loading {
                return false;
            }
            s.loading = false;
            if s.status == Status::Loading {
                s.status = if s.is_connected {
                    Status::Connected
                } else if s.error.is_some() {
                    Status::Error
                } else {
                    Status::Idle
                };
            }
            true
        });
    }
}

impl<T: PollData> Shared<T> {
    async fn fetch_once(&self) -> Result<T, ClientError> {
        let mut data = self
            .fetcher
            .fetch()
            .await?
            .into_result()
            .map_err(ClientError::Rejected)?;
        if self.validate {
            data.validate().map_err(ClientError::Invalid)?;
        }
        if !self.symbols.is_empty() {
            data.retain_symbols(&self.symbols);
        }
        Ok(data)
    }

    async fn fetch_cycle(&self, trigger: Trigger) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = InFlight::enter(self);
        self.state.send_modify(|s| {
            s.status = Status::Loading;
            s.loading = true;
        });
        debug!("[{}] {:?} fetch #{}", self.name, trigger, seq);

        let outcome = self.fetch_once().await;
        let remaining = guard.finish();

        if self.stopped.load(Ordering::SeqCst) {
            debug!("[{}] discarding fetch #{} after stop", self.name, seq);
            return;
        }
        if let Err(e) = &outcome {
            warn!("[{}] fetch #{} failed: {}", self.name, seq, e);
        }

        let now = self.clock.now();
        let mut superseded = false;
        self.state.send_if_modified(|s| {
            if seq <= self.applied_seq.load(Ordering::SeqCst) {
                superseded = true;
                if remaining == 0 && s.loading {
                    s.loading = false;
                    return true;
                }
                return false;
            }
            self.applied_seq.store(seq, Ordering::SeqCst);
            match outcome {
                Ok(data) => {
                    s.data = Some(data);
                    s.error = None;
                    s.last_update = Some(now);
                    s.is_connected = true;
                    s.status = Status::Connected;
                }
                Err(e) => {
                    s.error = Some(e.to_string());
                    s.is_connected = false;
                    s.status = Status::Error;
                }
            }
            s.loading = remaining > 0;
            true
        });
        if superseded {
            debug!("[{}] fetch #{} superseded by a newer response", self.name, seq);
        }
    }
}

pub struct Poller<T: PollData> {
    shared: Arc<Shared<T>>,
    update_interval: Duration,
    auto_refresh: bool,
    commands: Option<mpsc::UnboundedSender<Command>>,
    driver: Option<JoinHandle<()>>,
}

impl<T: PollData> Poller<T> {
    pub fn new(config: PollerConfig, fetcher: Arc<dyn Fetch<T>>) -> Self {
        Self::with_clock(config, fetcher, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: PollerConfig,
        fetcher: Arc<dyn Fetch<T>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(PollState::default());
        Self {
            shared: Arc::new(Shared {
                name: config.name,
                fetcher,
                clock,
                symbols: config.symbols,
                validate: config.validate,
                state,
                next_seq: AtomicU64::new(0),
                applied_seq: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                paused: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
            }),
            update_interval: config.update_interval,
            auto_refresh: config.auto_refresh,
            commands: None,
            driver: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> PollState<T> {
        self.shared.state.borrow().clone()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    /// Fetches once right away, then on every interval tick when
    /// auto-refresh is on. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.driver.is_some() || self.shared.stopped.load(Ordering::SeqCst) {
            warn!("[{}] start ignored: already started or stopped", self.name());
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = self.shared.clone();
        let every = self.update_interval.max(MIN_UPDATE_INTERVAL);
        if every != self.update_interval {
            warn!(
                "[{}] update interval {:?} raised to {:?}",
                self.name(),
                self.update_interval,
                every
            );
        }
        let auto_refresh = self.auto_refresh;
        self.commands = Some(tx);
        self.driver = Some(tokio::spawn(drive(shared, rx, every, auto_refresh)));
        info!(
            "[{}] polling every {:?} (auto refresh: {})",
            self.name(),
            every,
            auto_refresh
        );
    }

    /// Suspends the timer. A fetch already in flight still completes.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::SeqCst);
        self.send(Command::Pause);
    }

    /// Restarts the timer from a full interval; does not fetch by itself.
    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::SeqCst);
        self.send(Command::Resume);
    }

    /// Fetches immediately, outside the timer cadence. The returned future
    /// does not borrow the poller, so it can be spawned.
    pub fn refresh(&self) -> impl Future<Output = ()> + Send + 'static {
        let shared = self.shared.clone();
        async move { shared.fetch_cycle(Trigger::Manual).await }
    }

    /// Clears the timer. Nothing is published afterwards, including results
    /// of fetches still in flight.
    pub fn stop(&mut self) {
        if self.shared.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.commands = None;
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        info!("[{}] stopped", self.name());
    }

    fn send(&self, command: Command) {
        if let Some(tx) = &self.commands {
            if tx.send(command).is_err() {
                debug!("[{}] driver already gone", self.name());
            }
        }
    }
}

impl<T: PollData> Drop for Poller<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn drive<T: PollData>(
    shared: Arc<Shared<T>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    every: Duration,
    auto_refresh: bool,
) {
    shared.fetch_cycle(Trigger::Start).await;

    let mut ticker = time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut paused = false;

    loop {
        tokio::select! {
            _ = ticker.tick(), if auto_refresh && !paused => {
                if shared.in_flight.load(Ordering::SeqCst) > 0 {
                    debug!("[{}] tick skipped, fetch in flight", shared.name);
                    continue;
                }
                shared.fetch_cycle(Trigger::Timer).await;
            }
            command = commands.recv() => match command {
                Some(Command::Pause) => paused = true,
                Some(Command::Resume) => {
                    paused = false;
                    ticker.reset();
                }
                None => break,
            },
        }
    }
}
