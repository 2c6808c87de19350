use async_trait::async_trait;
use crate::error::Result;

pub mod coingecko;
pub mod funkit;
pub mod types;

pub use coingecko::CoinGeckoClient;
pub use funkit::FunKitClient;
pub use types::{AssetPriceResponse, PriceData, SimplePrice};

/// Per-token pricing keyed by chain and contract address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetPriceApi: Send + Sync {
    /// Fails when the client cannot issue any request at all (e.g. no API key).
    fn check_ready(&self) -> Result<()>;

    async fn asset_price(&self, chain_id: u64, asset_address: &str) -> Result<f64>;
}

/// Batch pricing keyed by a list of token ids.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchPriceApi: Send + Sync {
    async fn simple_prices(&self, ids: &[String]) -> Result<PriceData>;
}
