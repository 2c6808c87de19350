use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Contract address used for a chain's gas token.
pub const NATIVE_ASSET_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub logo: String,
    pub color: String,
    /// USD per unit. Zero means the price is unknown.
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub chain_logo: Option<String>,
    #[serde(default)]
    pub numeric_chain_id: Option<u64>,
}

impl Token {
    /// A copy of this token carrying the given quote.
    pub fn with_quote(&self, quote: PriceQuote) -> Token {
        Token {
            price: quote.price,
            price_change_24h: Some(quote.change_24h),
            volume_24h: Some(quote.volume_24h),
            ..self.clone()
        }
    }

    /// A copy with price, change and volume all zeroed.
    pub fn unpriced(&self) -> Token {
        self.with_quote(PriceQuote::default())
    }

    pub fn has_price(&self) -> bool {
        self.price > 0.0
    }

    pub fn is_native(&self) -> bool {
        match &self.contract_address {
            Some(address) => address == NATIVE_ASSET_ADDRESS,
            None => false,
        }
    }

    pub fn is_usd_pegged(&self) -> bool {
        self.symbol.contains("USD")
    }

    /// The address a per-token price lookup should use.
    pub fn price_lookup_address(&self) -> &str {
        if self.is_native() {
            NATIVE_ASSET_ADDRESS
        } else {
            self.contract_address.as_deref().unwrap_or("")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub color: String,
}

/// One token's quote inside a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
}

/// Quotes keyed by token id. Each successful fetch replaces the previous snapshot wholesale.
pub type PriceSnapshot = HashMap<String, PriceQuote>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Primary,
    Secondary,
}

impl PriceSource {
    /// Name of the upstream service behind this source.
    pub fn service_name(&self) -> &'static str {
        match self {
            PriceSource::Primary => "FunKit",
            PriceSource::Secondary => "CoinGecko",
        }
    }

    pub fn metric_label(&self) -> &'static str {
        match self {
            PriceSource::Primary => "funkit",
            PriceSource::Secondary => "coingecko",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

/// A price list is usable when it is non-empty and at least one token has a positive price.
pub fn is_valid_price_list(tokens: &[Token]) -> bool {
    !tokens.is_empty() && tokens.iter().any(Token::has_price)
}
