use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::models::{PriceQuote, PriceSnapshot};

/// One entry of the CoinGecko `simple/price` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplePrice {
    #[serde(default)]
    pub usd: Option<f64>,
    #[serde(default)]
    pub usd_24h_change: Option<f64>,
    #[serde(default)]
    pub usd_24h_vol: Option<f64>,
}

/// `simple/price` body: token id -> quote.
pub type PriceData = HashMap<String, SimplePrice>;

impl From<&SimplePrice> for PriceQuote {
    fn from(entry: &SimplePrice) -> Self {
        PriceQuote {
            price: entry.usd.unwrap_or_default(),
            change_24h: entry.usd_24h_change.unwrap_or_default(),
            volume_24h: entry.usd_24h_vol.unwrap_or_default(),
        }
    }
}

pub fn into_snapshot(data: &PriceData) -> PriceSnapshot {
    data.iter().map(|(id, entry)| (id.clone(), PriceQuote::from(entry))).collect()
}

/// FunKit answers a price lookup with either a bare number or an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AssetPriceResponse {
    Number(f64),
    Info(AssetPriceInfo),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPriceInfo {
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
}

impl AssetPriceResponse {
    pub fn unit_price(&self) -> f64 {
        match self {
            AssetPriceResponse::Number(price) => *price,
            AssetPriceResponse::Info(info) => info.unit_price.unwrap_or_default(),
        }
    }
}
