use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use crate::config::Config;
use crate::data;
use crate::error::{Error, Result};
use crate::feeds::PriceFetcher;
use crate::models::{PriceSource, Token};

// Helper to create a reference token with a given price
pub fn create_test_token(symbol: &str, price: f64) -> Token {
    let mut token = data::find_by_symbol(data::default_tokens(), symbol)
        .cloned()
        .unwrap_or_else(|| Token {
            id: symbol.to_lowercase(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            logo: "?".to_string(),
            color: "bg-gray-500".to_string(),
            price: 0.0,
            price_change_24h: None,
            volume_24h: None,
            contract_address: None,
            chain_id: Some("ethereum".to_string()),
            chain_logo: None,
            numeric_chain_id: Some(1),
        });
    token.price = price;
    token
}

// Every reference token priced from (symbol, price) pairs; unlisted tokens stay at zero
pub fn create_priced_tokens(prices: &[(&str, f64)]) -> Vec<Token> {
    data::default_tokens()
        .iter()
        .map(|t| {
            let mut t = t.clone();
            if let Some((_, p)) = prices.iter().find(|(s, _)| *s == t.symbol) {
                t.price = *p;
            }
            t
        })
        .collect()
}

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.api.funkit_api_key = "test".to_string();
    config.api.coingecko_api_key = "test".to_string();
    config
}

#[derive(Clone)]
enum Step {
    Ok(Vec<Token>),
    Err(String),
}

/// Fetcher that replays a fixed script of results, repeating the last one.
pub struct ScriptedFetcher {
    source: PriceSource,
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    fallback: Vec<Token>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn new(source: PriceSource) -> Self {
        Self {
            source,
            steps: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            fallback: Vec::new(),
            delay: None,
        }
    }

    pub fn then_ok(self, tokens: Vec<Token>) -> Self {
        self.steps.lock().unwrap().push_back(Step::Ok(tokens));
        self
    }

    pub fn then_err(self, message: &str) -> Self {
        self.steps.lock().unwrap().push_back(Step::Err(message.to_string()));
        self
    }

    pub fn with_fallback(mut self, tokens: Vec<Token>) -> Self {
        self.fallback = tokens;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PriceFetcher for ScriptedFetcher {
    fn source(&self) -> PriceSource {
        self.source
    }

    async fn fetch_tokens(&self) -> Result<Vec<Token>> {
        let step = {
            let next = self.steps.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(step) = next {
                *last = Some(step);
            }
            last.clone()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match step {
            Some(Step::Ok(tokens)) => Ok(tokens),
            Some(Step::Err(message)) => Err(Error::ApiError(message)),
            None => Err(Error::ApiError("no scripted result".to_string())),
        }
    }

    fn fallback_tokens(&self) -> Vec<Token> {
        self.fallback.clone()
    }
}
