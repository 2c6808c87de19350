use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use crate::api::types::AssetPriceResponse;
use crate::api::AssetPriceApi;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::validation::{validate_api_key, validate_price};

const SERVICE: &str = "FunKit";
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Clone)]
pub struct FunKitClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FunKitClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.funkit_api_key.clone(), config.funkit_base_url.clone())
    }

    fn price_url(&self, chain_id: u64, asset_address: &str) -> String {
        format!("{}/asset/erc20/price/{}/{}", self.base_url, chain_id, asset_address)
    }
}

#[async_trait]
impl AssetPriceApi for FunKitClient {
    fn check_ready(&self) -> Result<()> {
        validate_api_key(SERVICE, &self.api_key)
    }

    async fn asset_price(&self, chain_id: u64, asset_address: &str) -> Result<f64> {
        if asset_address.is_empty() {
            return Err(Error::InvalidInput(format!(
                "No contract address for asset on chain {}",
                chain_id
            )));
        }

        let url = self.price_url(chain_id, asset_address);
        debug!("Requesting {} price: {}", SERVICE, url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err = Error::from_status(status, SERVICE);
            error!("{} price request for {} failed: {}", SERVICE, asset_address, err);
            return Err(err);
        }

        let body: AssetPriceResponse = response.json().await.map_err(|e| {
            Error::ApiInvalidFormat(format!("Failed to parse {} response: {}", SERVICE, e))
        })?;

        let price = body.unit_price();
        validate_price(asset_address, price)?;
        Ok(price)
    }
}
