mod common;

use common::{create_offline_config, priced_tokens, unpriced_tokens, SequenceFetcher, POLL_INTERVAL, RETRY_GRACE};
use std::sync::Arc;
use std::time::Duration;
use token_swappa::feeds::aggregator::DefaultAggregator;
use token_swappa::feeds::coingecko::FALLBACK_NATIVE_PRICE;
use token_swappa::feeds::{AggregatedPriceState, PriceAggregator, PriceFetcher};
use token_swappa::models::PriceSource;

async fn settled<P: PriceFetcher, S: PriceFetcher>(aggregator: &PriceAggregator<P, S>) -> AggregatedPriceState {
    let mut rx = aggregator.subscribe();
    let state = rx.wait_for(|s| !s.loading).await.unwrap().clone();
    state
}

fn aggregator(primary: SequenceFetcher, secondary: SequenceFetcher) -> Arc<PriceAggregator<SequenceFetcher, SequenceFetcher>> {
    let aggregator = Arc::new(PriceAggregator::new(primary, secondary, POLL_INTERVAL, RETRY_GRACE));
    aggregator.start();
    aggregator
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_valid_primary_is_authoritative() {
    let aggregator = aggregator(
        SequenceFetcher::new(PriceSource::Primary).ok(priced_tokens(&[("ETH", 4307.23), ("USDC", 1.0)])),
        SequenceFetcher::new(PriceSource::Secondary).fail("HTTP error! status: 503"),
    );

    let state = settled(&aggregator).await;
    assert_eq!(state.source, Some(PriceSource::Primary));
    assert!(state.error.is_none());
    assert_eq!(state.tokens[0].price, 4307.23);
    aggregator.shutdown();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_primary_failure_is_masked_by_secondary() {
    let aggregator = aggregator(
        SequenceFetcher::new(PriceSource::Primary)
            .fallback(unpriced_tokens())
            .fail("FunKit API key is not configured"),
        SequenceFetcher::new(PriceSource::Secondary).ok(priced_tokens(&[("USDC", 1.0), ("USDT", 1.0)])),
    );

    let mut rx = aggregator.subscribe();
    let state = rx.wait_for(|s| s.source.is_some()).await.unwrap().clone();
    assert_eq!(state.source, Some(PriceSource::Secondary));
    assert!(state.error.is_none());
    assert!(state.tokens.iter().filter(|t| t.price == 1.0).count() == 2);
    aggregator.shutdown();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_double_failure_names_both_services() {
    let aggregator = aggregator(
        SequenceFetcher::new(PriceSource::Primary).fail("connection refused"),
        SequenceFetcher::new(PriceSource::Secondary).fail("HTTP error! status: 429"),
    );

    let mut rx = aggregator.subscribe();
    let state = rx
        .wait_for(|s| !s.loading && s.error.is_some())
        .await
        .unwrap()
        .clone();
    assert!(state.source.is_none());
    assert!(state.tokens.is_empty());

    let error = state.error.unwrap();
    assert!(error.starts_with("Both price services failed."), "{}", error);
    assert!(error.contains("FunKit: Network error: connection refused"), "{}", error);
    assert!(error.contains("CoinGecko: Network error: HTTP error! status: 429"), "{}", error);
    aggregator.shutdown();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_retry_restores_primary() {
    let aggregator = aggregator(
        SequenceFetcher::new(PriceSource::Primary)
            .fallback(unpriced_tokens())
            .fail("timeout")
            .ok(priced_tokens(&[("ETH", 4400.0)])),
        SequenceFetcher::new(PriceSource::Secondary).ok(priced_tokens(&[("ETH", 4300.0)])),
    );

    let mut rx = aggregator.subscribe();
    let state = rx.wait_for(|s| s.source.is_some()).await.unwrap().clone();
    assert_eq!(state.source, Some(PriceSource::Secondary));

    aggregator.retry().await;
    let state = rx
        .wait_for(|s| s.source == Some(PriceSource::Primary))
        .await
        .unwrap()
        .clone();
    assert_eq!(state.tokens[0].price, 4400.0);
    assert_eq!(aggregator.primary().retry_count(), 0);

    // Nothing changes underneath, so a second retry leaves the view as it is.
    aggregator.retry().await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    let again = aggregator.snapshot();
    assert_eq!(again.source, state.source);
    assert_eq!(again.tokens, state.tokens);
    aggregator.shutdown();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_background_poll_refreshes_prices() {
    let aggregator = aggregator(
        SequenceFetcher::new(PriceSource::Primary)
            .ok(priced_tokens(&[("ETH", 4300.0)]))
            .ok(priced_tokens(&[("ETH", 4350.0)])),
        SequenceFetcher::new(PriceSource::Secondary).ok(priced_tokens(&[("ETH", 4299.0)])),
    );

    assert_eq!(settled(&aggregator).await.tokens[0].price, 4300.0);

    tokio::time::sleep(POLL_INTERVAL + Duration::from_secs(1)).await;
    let state = aggregator.snapshot();
    assert_eq!(state.source, Some(PriceSource::Primary));
    assert_eq!(state.tokens[0].price, 4350.0);
    aggregator.shutdown();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_poll_in_flight_keeps_prices_visible() {
    let aggregator = aggregator(
        SequenceFetcher::new(PriceSource::Primary)
            .delayed(Duration::from_secs(1))
            .ok(priced_tokens(&[("ETH", 4300.0)]))
            .ok(priced_tokens(&[("ETH", 4350.0)])),
        SequenceFetcher::new(PriceSource::Secondary).ok(priced_tokens(&[("ETH", 4299.0)])),
    );

    let state = settled(&aggregator).await;
    assert!(state.is_settled());

    // The primary's first poll fires one interval after its initial load and takes 1s.
    tokio::time::sleep(POLL_INTERVAL + Duration::from_millis(500)).await;
    let state = aggregator.snapshot();
    assert!(state.updating);
    assert!(!state.loading);
    assert_eq!(state.source, Some(PriceSource::Primary));
    assert_eq!(state.tokens[0].price, 4300.0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let state = aggregator.snapshot();
    assert!(state.is_settled());
    assert_eq!(state.tokens[0].price, 4350.0);
    aggregator.shutdown();
}

#[test_log::test(tokio::test)]
async fn test_unreachable_services_fall_back_to_reference_table() {
    let aggregator = Arc::new(DefaultAggregator::from_config(&create_offline_config()));
    aggregator.start();

    let state = settled(&aggregator).await;
    assert_eq!(state.source, Some(PriceSource::Secondary));

    let eth = state.tokens.iter().find(|t| t.symbol == "ETH").unwrap();
    assert_eq!(eth.price, FALLBACK_NATIVE_PRICE);
    let usdc = state.tokens.iter().find(|t| t.symbol == "USDC").unwrap();
    assert_eq!(usdc.price, 1.0);

    let error = state.error.unwrap();
    assert!(error.starts_with("FunKit: "), "{}", error);
    assert!(error.contains("CoinGecko: "), "{}", error);
    aggregator.shutdown();
}
