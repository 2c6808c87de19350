//! Amount conversion between the two sides of the swap form.
//!
//! Everything here is synchronous and side-effect free; [`ConversionEngine`]
//! layers debouncing and shared state on top.

use serde::Serialize;
use crate::formatters::{format_currency, CurrencyOptions};
use crate::models::Token;

pub mod engine;

pub use engine::ConversionEngine;

pub const USD_DECIMALS: usize = 2;
pub const TOKEN_DECIMALS: usize = 6;

/// The swap form. Amounts are kept exactly as typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionState {
    pub from_token: Option<Token>,
    pub to_token: Option<Token>,
    pub from_amount: String,
    pub to_amount: String,
    pub from_usd_mode: bool,
    pub to_usd_mode: bool,
    pub from_recalculating: bool,
    pub to_recalculating: bool,
}

impl Default for ConversionState {
    fn default() -> Self {
        Self {
            from_token: None,
            to_token: None,
            from_amount: String::new(),
            to_amount: String::new(),
            from_usd_mode: true,
            to_usd_mode: false,
            from_recalculating: false,
            to_recalculating: false,
        }
    }
}

impl ConversionState {
    pub fn tokens_selected(&self) -> bool {
        self.from_token.is_some() && self.to_token.is_some()
    }

    /// The `to` amount implied by the current `from` side.
    pub fn forward(&self) -> String {
        self.forward_of(&self.from_amount)
    }

    /// The `from` amount implied by the current `to` side.
    pub fn reverse(&self) -> String {
        self.reverse_of(&self.to_amount)
    }

    /// Forward conversion of `amount` using the current tokens and modes.
    pub fn forward_of(&self, amount: &str) -> String {
        match (&self.from_token, &self.to_token) {
            (Some(from), Some(to)) => convert(
                amount,
                from,
                to,
                self.from_usd_mode,
                self.to_usd_mode,
            ),
            _ => String::new(),
        }
    }

    pub fn reverse_of(&self, amount: &str) -> String {
        match (&self.from_token, &self.to_token) {
            (Some(from), Some(to)) => convert(
                amount,
                to,
                from,
                self.to_usd_mode,
                self.from_usd_mode,
            ),
            _ => String::new(),
        }
    }

    /// Exchanges both sides. The last computed `to` amount becomes the new `from` amount.
    pub fn swapped(&self) -> ConversionState {
        ConversionState {
            from_token: self.to_token.clone(),
            to_token: self.from_token.clone(),
            from_amount: self.to_amount.clone(),
            to_amount: self.from_amount.clone(),
            from_usd_mode: self.to_usd_mode,
            to_usd_mode: self.from_usd_mode,
            from_recalculating: false,
            to_recalculating: false,
        }
    }
}

fn parse_amount(amount: &str) -> Option<f64> {
    if amount.is_empty() {
        return None;
    }
    amount.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_fixed(value: f64, usd_mode: bool) -> String {
    let decimals = if usd_mode { USD_DECIMALS } else { TOKEN_DECIMALS };
    format!("{:.*}", decimals, value)
}

/// Converts an amount entered against `source` into the equivalent amount of `target`.
///
/// USD-mode inputs are divided by the source price first; a USD-mode target is
/// priced back into dollars. Returns an empty string whenever the result cannot
/// be computed: empty or unparsable input, a zero price, or a non-finite value.
pub fn convert(amount: &str, source: &Token, target: &Token, source_usd: bool, target_usd: bool) -> String {
    let value = match parse_amount(amount) {
        Some(v) => v,
        None => return String::new(),
    };
    if source.price == 0.0 || target.price == 0.0 {
        return String::new();
    }

    let source_units = if source_usd { value / source.price } else { value };
    let target_units = source_units * (source.price / target.price);
    let result = if target_usd { target_units * target.price } else { target_units };

    if !result.is_finite() {
        return String::new();
    }
    format_fixed(result, target_usd)
}

/// The USD value of one side, to two decimals. `"0.00"` when it cannot be computed.
pub fn usd_value(amount: &str, token: Option<&Token>, usd_mode: bool) -> String {
    let (value, token) = match (parse_amount(amount), token) {
        (Some(v), Some(t)) => (v, t),
        _ => return "0.00".to_string(),
    };
    let usd = if usd_mode { value } else { value * token.price };
    if !usd.is_finite() {
        return "0.00".to_string();
    }
    format!("{:.2}", usd)
}

/// `"1 ETH = 4307.230000 USDC ($4,307.23)"`. Empty until both tokens are priced.
pub fn exchange_rate_label(from: Option<&Token>, to: Option<&Token>) -> String {
    let (from, to) = match (from, to) {
        (Some(f), Some(t)) => (f, t),
        _ => return String::new(),
    };
    let rate = from.price / to.price;
    if !rate.is_finite() {
        return String::new();
    }
    format!(
        "1 {} = {:.6} {} ({})",
        from.symbol,
        rate,
        to.symbol,
        format_currency(Some(from.price), CurrencyOptions::default())
    )
}

/// Signed USD difference between the two sides, as a percentage of the `from` side.
pub fn price_change_label(state: &ConversionState) -> String {
    const NOT_COMPUTABLE: &str = "0.00%";

    let (from, to) = match (&state.from_token, &state.to_token) {
        (Some(f), Some(t)) => (f, t),
        _ => return NOT_COMPUTABLE.to_string(),
    };
    let (from_amount, to_amount) = match (parse_amount(&state.from_amount), parse_amount(&state.to_amount)) {
        (Some(f), Some(t)) => (f, t),
        _ => return NOT_COMPUTABLE.to_string(),
    };

    let from_usd = if state.from_usd_mode { from_amount } else { from_amount * from.price };
    let to_usd = if state.to_usd_mode { to_amount } else { to_amount * to.price };

    let change = (to_usd - from_usd) / from_usd * 100.0;
    if !change.is_finite() {
        return NOT_COMPUTABLE.to_string();
    }
    let sign = if change >= 0.0 { "+" } else { "" };
    format!("{}{:.3}%", sign, change)
}
