#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use token_swappa::config::Config;
use token_swappa::data;
use token_swappa::error::{Error, Result};
use token_swappa::feeds::PriceFetcher;
use token_swappa::models::{PriceSource, Token};

pub const POLL_INTERVAL: Duration = Duration::from_secs(300);
pub const RETRY_GRACE: Duration = Duration::from_secs(2);

// Reference tokens priced from (symbol, price) pairs; the rest stay at zero
pub fn priced_tokens(prices: &[(&str, f64)]) -> Vec<Token> {
    data::default_tokens()
        .iter()
        .map(|t| {
            let mut t = t.clone();
            t.price = prices
                .iter()
                .find(|(symbol, _)| *symbol == t.symbol)
                .map(|(_, price)| *price)
                .unwrap_or(0.0);
            t
        })
        .collect()
}

pub fn unpriced_tokens() -> Vec<Token> {
    priced_tokens(&[])
}

// Config whose services cannot be reached: no FunKit key, CoinGecko on a closed port
pub fn create_offline_config() -> Config {
    let mut config = Config::default();
    config.api.funkit_api_key = String::new();
    config.api.coingecko_api_key = String::new();
    config.api.funkit_base_url = "http://127.0.0.1:9".to_string();
    config.api.coingecko_base_url = "http://127.0.0.1:9".to_string();
    config
}

/// Replays queued outcomes in order; the last one repeats forever.
pub struct SequenceFetcher {
    source: PriceSource,
    outcomes: Mutex<VecDeque<std::result::Result<Vec<Token>, String>>>,
    fallback: Vec<Token>,
    delay: Duration,
}

impl SequenceFetcher {
    pub fn new(source: PriceSource) -> Self {
        Self {
            source,
            outcomes: Mutex::new(VecDeque::new()),
            fallback: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn ok(self, tokens: Vec<Token>) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(tokens));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn fallback(mut self, tokens: Vec<Token>) -> Self {
        self.fallback = tokens;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn next_outcome(&self) -> std::result::Result<Vec<Token>, String> {
        let mut outcomes = self.outcomes.lock().unwrap();
        match outcomes.len() {
            0 => Err("nothing queued".to_string()),
            1 => outcomes[0].clone(),
            _ => outcomes.pop_front().unwrap(),
        }
    }
}

#[async_trait]
impl PriceFetcher for SequenceFetcher {
    fn source(&self) -> PriceSource {
        self.source
    }

    async fn fetch_tokens(&self) -> Result<Vec<Token>> {
        let outcome = self.next_outcome();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        outcome.map_err(Error::NetworkError)
    }

    fn fallback_tokens(&self) -> Vec<Token> {
        self.fallback.clone()
    }
}
