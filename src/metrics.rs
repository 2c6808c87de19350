use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use lazy_static::lazy_static;
use crate::models::PriceSource;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref PRICE_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("price_requests_total", "Total number of price fetch cycles"),
        &["source"]
    ).expect("metric can be created");

    pub static ref PRICE_REQUEST_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("price_request_errors_total", "Total number of failed price fetch cycles"),
        &["source"]
    ).expect("metric can be created");

    pub static ref PRICE_FALLBACKS: IntCounterVec = IntCounterVec::new(
        Opts::new("price_fallbacks_total", "Times a feed published its fallback table"),
        &["source"]
    ).expect("metric can be created");

    pub static ref ACTIVE_SOURCE: IntGauge = IntGauge::new(
        "active_price_source",
        "Authoritative price source (0 none, 1 primary, 2 secondary)"
    ).expect("metric can be created");
}

pub fn init() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(PRICE_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(PRICE_REQUEST_ERRORS.clone()))?;
    REGISTRY.register(Box::new(PRICE_FALLBACKS.clone()))?;
    REGISTRY.register(Box::new(ACTIVE_SOURCE.clone()))?;
    Ok(())
}

pub fn record_active_source(source: Option<PriceSource>) {
    ACTIVE_SOURCE.set(match source {
        None => 0,
        Some(PriceSource::Primary) => 1,
        Some(PriceSource::Secondary) => 2,
    });
}

/// Text exposition of everything registered in [`REGISTRY`].
pub fn render() -> crate::error::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| crate::error::Error::InternalError(e.to_string()))
}
