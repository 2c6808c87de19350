use crate::error::{Result, Error};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

lazy_static! {
    static ref AMOUNT_PATTERN: Regex = Regex::new(r"^\d*\.?\d*$").expect("amount pattern compiles");
}

pub fn validate_api_key(service: &str, api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(Error::ConfigError(format!("{} API key is not configured", service)));
    }
    Ok(())
}

/// Rejects prices a feed must never publish: negative, NaN or infinite.
pub fn validate_price(symbol: &str, price: f64) -> Result<()> {
    if !price.is_finite() {
        return Err(Error::ApiInvalidData(format!("Non-finite price for {}: {}", symbol, price)));
    }
    if price < 0.0 {
        return Err(Error::ApiInvalidData(format!("Negative price for {}: {}", symbol, price)));
    }
    Ok(())
}

/// Applies an edit to an amount field.
///
/// `current` is the field's value before the edit and `raw` the text the user
/// produced. Returns the value to store, or `None` when the edit is rejected
/// and the field must keep `current`.
pub fn sanitize_amount_input(current: &str, raw: &str) -> Option<String> {
    let mut value = raw.to_string();

    // Editing a lone "0": "05" and "5" both become "5", "0." stays a decimal.
    if current == "0" {
        if raw == "." {
            value = "0.".to_string();
        } else if let Some(rest) = raw.strip_prefix('0') {
            if rest.len() == 1 && rest != "." && rest != "0" {
                value = rest.to_string();
            }
        }
    }

    if value.is_empty() || AMOUNT_PATTERN.is_match(&value) {
        Some(value)
    } else {
        warn!("Rejected amount input: {:?}", raw);
        None
    }
}
