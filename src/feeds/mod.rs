//! Price feeds: two independently polled sources, each publishing into its own
//! single-slot state cell, and the aggregator that merges them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use crate::error::Result;
use crate::metrics;
use crate::models::{PriceSource, Token};

pub mod aggregator;
pub mod coingecko;
pub mod funkit;

pub use aggregator::{aggregate, AggregatedPriceState, PriceAggregator};
pub use coingecko::CoinGeckoFetcher;
pub use funkit::FunKitFetcher;

/// What one feed currently knows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedState {
    pub tokens: Vec<Token>,
    /// A blocking (initial or retry) fetch is in flight.
    pub loading: bool,
    /// A background poll is in flight.
    pub updating: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            loading: true,
            updating: false,
            error: None,
            last_updated: None,
        }
    }
}

/// One upstream price service as seen by a [`PriceFeed`].
#[async_trait]
pub trait PriceFetcher: Send + Sync + 'static {
    fn source(&self) -> PriceSource;

    /// Runs one fetch cycle. An `Err` is a batch failure.
    async fn fetch_tokens(&self) -> Result<Vec<Token>>;

    /// Published instead of live data when the first attempt fails.
    fn fallback_tokens(&self) -> Vec<Token>;
}

pub struct PriceFeed<F: PriceFetcher> {
    fetcher: F,
    state: watch::Sender<FeedState>,
    retry_count: AtomicU32,
}

impl<F: PriceFetcher> PriceFeed<F> {
    pub fn new(fetcher: F) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            fetcher,
            state,
            retry_count: AtomicU32::new(0),
        }
    }

    pub fn source(&self) -> PriceSource {
        self.fetcher.source()
    }

    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::SeqCst)
    }

    /// Runs one fetch cycle and publishes the result.
    ///
    /// `initial` fetches drive `loading`; background polls drive `updating`.
    /// Failures never escape: they land in `FeedState::error`.
    pub async fn fetch(&self, initial: bool) {
        let source = self.source();
        self.state.send_modify(|s| {
            if initial {
                s.loading = true;
            } else {
                s.updating = true;
            }
            s.error = None;
        });

        info!("Fetching prices from {} (initial: {})", source, initial);
        metrics::PRICE_REQUESTS.with_label_values(&[source.metric_label()]).inc();

        let outcome = self.fetcher.fetch_tokens().await;
        // Read after the await: a retry issued mid-flight counts.
        let first_attempt = self.retry_count() == 0;

        let fallback = match &outcome {
            Err(_) if first_attempt => Some(self.fetcher.fallback_tokens()),
            _ => None,
        };

        match &outcome {
            Ok(tokens) => {
                info!("{} returned {} tokens", source, tokens.len());
                self.retry_count.store(0, Ordering::SeqCst);
            }
            Err(e) => {
                error!("Failed to fetch prices from {}: {}", source, e);
                metrics::PRICE_REQUEST_ERRORS.with_label_values(&[source.metric_label()]).inc();
                if fallback.is_some() {
                    warn!("Publishing {} fallback prices after first failure", source);
                    metrics::PRICE_FALLBACKS.with_label_values(&[source.metric_label()]).inc();
                }
            }
        }

        self.state.send_modify(|s| {
            match outcome {
                Ok(tokens) => {
                    s.tokens = tokens;
                    s.last_updated = Some(Utc::now());
                }
                Err(e) => {
                    s.error = Some(e.to_string());
                    if let Some(tokens) = fallback {
                        s.tokens = tokens;
                    }
                }
            }
            if initial {
                s.loading = false;
            }
            s.updating = false;
        });
    }

    /// Counts an explicit retry and refetches with initial-load semantics.
    pub async fn retry(&self) {
        let attempt = self.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Retrying {} (attempt {})", self.source(), attempt);
        self.fetch(true).await;
    }

    /// Fetches once immediately, then every `every` in the background.
    pub fn spawn_polling(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.fetch(true).await;

            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.fetch(false).await;
            }
        })
    }
}
