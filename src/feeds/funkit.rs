use async_trait::async_trait;
use log::{debug, warn};
use crate::api::{AssetPriceApi, FunKitClient};
use crate::data;
use crate::error::Result;
use crate::feeds::PriceFetcher;
use crate::models::{PriceQuote, PriceSource, Token};

/// Primary source: one sequential price lookup per configured token.
///
/// The service only knows unit prices, so 24h change and volume are always zero.
pub struct FunKitFetcher<A: AssetPriceApi = FunKitClient> {
    api: A,
    tokens: Vec<Token>,
}

impl<A: AssetPriceApi> FunKitFetcher<A> {
    pub fn new(api: A) -> Self {
        Self::with_tokens(api, data::default_tokens().to_vec())
    }

    pub fn with_tokens(api: A, tokens: Vec<Token>) -> Self {
        Self { api, tokens }
    }
}

#[async_trait]
impl<A: AssetPriceApi + 'static> PriceFetcher for FunKitFetcher<A> {
    fn source(&self) -> PriceSource {
        PriceSource::Primary
    }

    async fn fetch_tokens(&self) -> Result<Vec<Token>> {
        self.api.check_ready()?;

        let mut priced = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            let chain_id = match token.numeric_chain_id {
                Some(id) => id,
                None => {
                    warn!("Unknown chain ID for token {}", token.symbol);
                    continue;
                }
            };

            match self.api.asset_price(chain_id, token.price_lookup_address()).await {
                Ok(price) => {
                    debug!("FunKit price for {}: {}", token.symbol, price);
                    priced.push(token.with_quote(PriceQuote {
                        price,
                        change_24h: 0.0,
                        volume_24h: 0.0,
                    }));
                }
                Err(e) => {
                    // One token failing must not sink the batch.
                    warn!("Failed to fetch price for {}: {}", token.symbol, e);
                    priced.push(token.unpriced());
                }
            }
        }

        Ok(priced)
    }

    /// Zero prices everywhere, so the aggregator falls through to the secondary source.
    fn fallback_tokens(&self) -> Vec<Token> {
        self.tokens.iter().map(Token::unpriced).collect()
    }
}
