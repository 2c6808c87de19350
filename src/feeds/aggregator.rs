use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use crate::api::{CoinGeckoClient, FunKitClient};
use crate::config::Config;
use crate::feeds::{CoinGeckoFetcher, FeedState, FunKitFetcher, PriceFeed, PriceFetcher};
use crate::metrics;
use crate::models::{is_valid_price_list, PriceSource, Token};

/// The single view consumers see, whichever feed backs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPriceState {
    pub tokens: Vec<Token>,
    pub loading: bool,
    pub updating: bool,
    pub error: Option<String>,
    pub source: Option<PriceSource>,
}

impl Default for AggregatedPriceState {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            loading: true,
            updating: false,
            error: None,
            source: None,
        }
    }
}

impl AggregatedPriceState {
    /// No fetch is in flight, neither a first load nor a background poll.
    pub fn is_settled(&self) -> bool {
        !self.loading && !self.updating
    }
}

/// Picks the authoritative feed. Pure: the same inputs always give the same state.
///
/// While a feed is still loading the previous tokens, error and source are kept.
pub fn aggregate(
    primary: &FeedState,
    secondary: &FeedState,
    previous: &AggregatedPriceState,
) -> AggregatedPriceState {
    if primary.loading {
        return AggregatedPriceState {
            loading: true,
            updating: false,
            ..previous.clone()
        };
    }

    if is_valid_price_list(&primary.tokens) {
        return AggregatedPriceState {
            tokens: primary.tokens.clone(),
            loading: false,
            updating: primary.updating,
            error: None,
            source: Some(PriceSource::Primary),
        };
    }

    if !secondary.loading && !secondary.tokens.is_empty() {
        // The secondary's data masks a primary failure on its own.
        let error = match (&primary.error, &secondary.error) {
            (Some(p), Some(s)) => Some(format!(
                "{}: {}, {}: {}",
                PriceSource::Primary,
                p,
                PriceSource::Secondary,
                s
            )),
            (Some(_), None) => None,
            (None, s) => s.clone(),
        };
        return AggregatedPriceState {
            tokens: secondary.tokens.clone(),
            loading: false,
            updating: secondary.updating,
            error,
            source: Some(PriceSource::Secondary),
        };
    }

    if secondary.loading {
        return AggregatedPriceState {
            loading: true,
            updating: false,
            ..previous.clone()
        };
    }

    AggregatedPriceState {
        tokens: Vec::new(),
        loading: false,
        updating: false,
        error: Some(format!(
            "Both price services failed. {}: {}, {}: {}",
            PriceSource::Primary,
            primary.error.as_deref().unwrap_or("Unknown error"),
            PriceSource::Secondary,
            secondary.error.as_deref().unwrap_or("Unknown error")
        )),
        source: None,
    }
}

pub type DefaultAggregator =
    PriceAggregator<FunKitFetcher<FunKitClient>, CoinGeckoFetcher<CoinGeckoClient>>;

/// Runs both feeds and keeps an [`AggregatedPriceState`] in sync with them.
pub struct PriceAggregator<P: PriceFetcher, S: PriceFetcher> {
    primary: Arc<PriceFeed<P>>,
    secondary: Arc<PriceFeed<S>>,
    state: watch::Sender<AggregatedPriceState>,
    poll_interval: Duration,
    retry_grace: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DefaultAggregator {
    pub fn from_config(config: &Config) -> Self {
        PriceAggregator::new(
            FunKitFetcher::new(FunKitClient::from_config(&config.api)),
            CoinGeckoFetcher::new(CoinGeckoClient::from_config(&config.api)),
            config.polling.interval(),
            config.polling.retry_grace(),
        )
    }
}

impl<P: PriceFetcher, S: PriceFetcher> PriceAggregator<P, S> {
    pub fn new(primary: P, secondary: S, poll_interval: Duration, retry_grace: Duration) -> Self {
        let (state, _) = watch::channel(AggregatedPriceState::default());
        Self {
            primary: Arc::new(PriceFeed::new(primary)),
            secondary: Arc::new(PriceFeed::new(secondary)),
            state,
            poll_interval,
            retry_grace,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn primary(&self) -> &Arc<PriceFeed<P>> {
        &self.primary
    }

    pub fn secondary(&self) -> &Arc<PriceFeed<S>> {
        &self.secondary
    }

    pub fn snapshot(&self) -> AggregatedPriceState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregatedPriceState> {
        self.state.subscribe()
    }

    /// Re-derives the aggregate from both feeds. Only real changes notify subscribers.
    pub fn recompute(&self) {
        let primary = self.primary.state();
        let secondary = self.secondary.state();

        self.state.send_if_modified(|current| {
            let next = aggregate(&primary, &secondary, current);
            if next == *current {
                return false;
            }
            if next.source != current.source {
                match next.source {
                    Some(source) => info!("Price source is now {}", source),
                    None if !next.loading => warn!("No usable price source: {:?}", next.error),
                    None => debug!("Waiting for price sources"),
                }
                metrics::record_active_source(next.source);
            }
            *current = next;
            true
        });
    }

    /// Starts both pollers and the task that folds their updates into the aggregate.
    pub fn start(self: &Arc<Self>) {
        let mut primary_rx = self.primary.subscribe();
        let mut secondary_rx = self.secondary.subscribe();

        let this = Arc::clone(self);
        let watcher = tokio::spawn(async move {
            this.recompute();
            loop {
                tokio::select! {
                    changed = primary_rx.changed() => if changed.is_err() { break },
                    changed = secondary_rx.changed() => if changed.is_err() { break },
                }
                this.recompute();
            }
        });

        let primary = Arc::clone(&self.primary).spawn_polling(self.poll_interval);
        let secondary = Arc::clone(&self.secondary).spawn_polling(self.poll_interval);

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.extend([watcher, primary, secondary]);
        }
        info!("Price aggregator started (polling every {:?})", self.poll_interval);
    }

    /// Retries the primary feed now, and the secondary after the grace period
    /// if the primary still has no usable prices by then.
    ///
    /// The primary retry is not awaited; it may still land after the secondary retry.
    pub async fn retry(&self) {
        info!("Retrying price feeds");
        self.state.send_if_modified(|s| {
            let changed = s.source.is_some() || s.error.is_some();
            s.source = None;
            s.error = None;
            changed
        });

        let primary = Arc::clone(&self.primary);
        tokio::spawn(async move { primary.retry().await });

        tokio::time::sleep(self.retry_grace).await;

        if is_valid_price_list(&self.primary.state().tokens) {
            debug!("Primary prices recovered within grace period");
            return;
        }
        info!("Primary prices still unusable after {:?}, retrying secondary", self.retry_grace);
        self.secondary.retry().await;
    }

    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
        info!("Price aggregator stopped");
    }
}

impl<P: PriceFetcher, S: PriceFetcher> Drop for PriceAggregator<P, S> {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}
