//! Static reference data: the supported chains and tokens, plus the lookup
//! helpers the token picker needs.

use lazy_static::lazy_static;
use crate::models::{Chain, Token};
use crate::models::token::NATIVE_ASSET_ADDRESS;

const ETHEREUM_CHAIN_ID: u64 = 1;

lazy_static! {
    static ref CHAINS: Vec<Chain> = vec![
        chain("ethereum", "Ethereum", "⟠", "bg-blue-500"),
        chain("binance-smart-chain", "BSC", "⬢", "bg-yellow-500"),
        chain("polygon-pos", "Polygon", "⬟", "bg-purple-500"),
        chain("arbitrum-one", "Arbitrum", "◆", "bg-blue-600"),
    ];

    static ref DEFAULT_TOKENS: Vec<Token> = vec![
        ethereum_token("ethereum", "ETH", "Ethereum", "⟠", "bg-blue-500", NATIVE_ASSET_ADDRESS),
        ethereum_token("usd-coin", "USDC", "USD Coin", "$", "bg-blue-600", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        ethereum_token("tether", "USDT", "Tether", "₮", "bg-green-500", "0xdAC17F958D2ee523a2206206994597C13D831ec7"),
        ethereum_token("dai", "DAI", "Dai Stablecoin", "◈", "bg-yellow-500", "0x6B175474E89094C44Da98b954EedeAC495271d0F"),
        ethereum_token("wrapped-bitcoin", "WBTC", "Wrapped Bitcoin", "₿", "bg-orange-500", "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"),
        ethereum_token("chainlink", "LINK", "Chainlink", "⬡", "bg-blue-700", "0x514910771AF9Ca656af840dff83E8264EcF986CA"),
    ];
}

fn chain(id: &str, name: &str, logo: &str, color: &str) -> Chain {
    Chain {
        id: id.to_string(),
        name: name.to_string(),
        logo: logo.to_string(),
        color: color.to_string(),
    }
}

fn ethereum_token(id: &str, symbol: &str, name: &str, logo: &str, color: &str, address: &str) -> Token {
    Token {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        logo: logo.to_string(),
        color: color.to_string(),
        price: 0.0,
        price_change_24h: None,
        volume_24h: None,
        contract_address: Some(address.to_string()),
        chain_id: Some("ethereum".to_string()),
        chain_logo: None,
        numeric_chain_id: Some(ETHEREUM_CHAIN_ID),
    }
}

pub fn chains() -> &'static [Chain] {
    &CHAINS
}

/// Every supported token, unpriced, in display order.
pub fn default_tokens() -> &'static [Token] {
    &DEFAULT_TOKENS
}

/// The batch the secondary feed requests: the four most liquid tokens after ETH.
pub fn top_tokens() -> &'static [Token] {
    &DEFAULT_TOKENS[1..5]
}

/// Quick-select row.
pub fn popular_tokens() -> &'static [Token] {
    &DEFAULT_TOKENS[0..4]
}

pub fn chain_by_id(id: &str) -> Option<&'static Chain> {
    CHAINS.iter().find(|c| c.id == id)
}

pub fn find_by_symbol<'a>(tokens: &'a [Token], symbol: &str) -> Option<&'a Token> {
    tokens.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

/// Case-insensitive substring match on symbol or name.
pub fn search_tokens<'a>(tokens: &'a [Token], query: &str) -> Vec<&'a Token> {
    let query = query.to_lowercase();
    tokens
        .iter()
        .filter(|t| t.symbol.to_lowercase().contains(&query) || t.name.to_lowercase().contains(&query))
        .collect()
}

/// Highest 24h volume first; tokens without a volume sort as zero.
pub fn tokens_by_volume(tokens: &[Token]) -> Vec<&Token> {
    let mut sorted: Vec<&Token> = tokens.iter().collect();
    sorted.sort_by(|a, b| {
        let va = a.volume_24h.unwrap_or(0.0);
        let vb = b.volume_24h.unwrap_or(0.0);
        vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
}
