use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use crate::api::types::PriceData;
use crate::api::BatchPriceApi;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::validation::validate_price;

const SERVICE: &str = "CoinGecko";

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(Some(config.coingecko_api_key.clone()), config.coingecko_base_url.clone())
    }

    fn simple_price_query(&self, ids: &[String]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ids", ids.join(",")),
            ("vs_currencies", "usd".to_string()),
            ("include_24hr_change", "true".to_string()),
            ("include_24hr_vol", "true".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("x_cg_demo_api_key", key.clone()));
        }
        params
    }
}

#[async_trait]
impl BatchPriceApi for CoinGeckoClient {
    async fn simple_prices(&self, ids: &[String]) -> Result<PriceData> {
        if ids.is_empty() {
            return Ok(PriceData::new());
        }

        let url = format!("{}/simple/price", self.base_url);
        debug!("Requesting {} prices for {}", SERVICE, ids.join(","));

        let response = self
            .client
            .get(&url)
            .query(&self.simple_price_query(ids))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err = Error::from_status(status, SERVICE);
            error!("{} price request failed: {}", SERVICE, err);
            return Err(err);
        }

        let data: PriceData = response.json().await.map_err(|e| {
            Error::ApiInvalidFormat(format!("Failed to parse {} response: {}", SERVICE, e))
        })?;

        for (id, entry) in &data {
            if let Some(price) = entry.usd {
                validate_price(id, price)?;
            }
        }

        info!("{} returned prices for {} of {} ids", SERVICE, data.len(), ids.len());
        Ok(data)
    }
}
