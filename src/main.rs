use anyhow::{anyhow, bail, Result};
use clap::Parser;
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;

use token_swappa::cli::{Cli, Command};
use token_swappa::config::Config;
use token_swappa::conversion::{exchange_rate_label, price_change_label, usd_value, ConversionEngine};
use token_swappa::data;
use token_swappa::feeds::aggregator::DefaultAggregator;
use token_swappa::feeds::AggregatedPriceState;
use token_swappa::formatters::{format_currency, format_token_amount_str, CurrencyOptions};
use token_swappa::{logging, metrics};

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

fn load_config(path: Option<&Path>) -> Result<Config> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let path = path.or_else(|| default_path.exists().then_some(default_path));
    let Some(path) = path else {
        return Ok(Config::from_env()?);
    };

    let mut config =
        Config::load(path).map_err(|e| anyhow!("Failed to load configuration from {:?}: {}", path, e))?;
    config.apply_env();
    config.validate()?;
    Ok(config)
}

fn init_logging(config: &Config, debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { config.logging.level.as_str() };
    match &config.logging.file {
        Some(file) => logging::init(file, level).map_err(|e| anyhow!("Failed to open log file {}: {}", file, e))?,
        None => env_logger::Builder::new()
            .filter_level(logging::parse_level(level))
            .parse_default_env()
            .init(),
    }
    Ok(())
}

/// Waits for the first settled aggregate, retrying once if both sources failed.
async fn settled_prices(aggregator: &DefaultAggregator) -> Result<AggregatedPriceState> {
    let mut rx = aggregator.subscribe();
    let state = rx.wait_for(|s| !s.loading).await?.clone();
    if state.source.is_some() {
        return Ok(state);
    }

    warn!("No price source available, retrying");
    aggregator.retry().await;
    aggregator.recompute();
    let state = rx.wait_for(|s| !s.loading).await?.clone();
    match state.source {
        Some(_) => Ok(state),
        None => Err(anyhow!(state.error.unwrap_or_else(|| "No prices available".to_string()))),
    }
}

fn print_prices(state: &AggregatedPriceState) {
    let source = state.source.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string());
    println!("Source: {}", source);
    if let Some(err) = &state.error {
        println!("Warning: {}", err);
    }
    for token in data::tokens_by_volume(&state.tokens) {
        let change = token
            .price_change_24h
            .map(|c| format!("{:+.2}%", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<20} {:>14} {:>9} {:>10}",
            token.symbol,
            token.name,
            format_currency(Some(token.price), CurrencyOptions::default()),
            change,
            format_currency(token.volume_24h, CurrencyOptions::default()),
        );
    }
}

async fn quote(
    config: &Config,
    aggregator: &DefaultAggregator,
    from: &str,
    to: &str,
    amount: &str,
    from_usd: bool,
    to_usd: bool,
) -> Result<()> {
    let prices = settled_prices(aggregator).await?;
    let from_token = data::find_by_symbol(&prices.tokens, from).ok_or_else(|| anyhow!("Unknown token: {}", from))?;
    let to_token = data::find_by_symbol(&prices.tokens, to).ok_or_else(|| anyhow!("Unknown token: {}", to))?;

    let engine = ConversionEngine::from_config(&config.conversion);
    engine.apply_prices(&prices.tokens);
    engine.set_from_token(Some(from_token.clone()));
    engine.set_to_token(Some(to_token.clone()));
    engine.set_from_usd_mode(from_usd);
    engine.set_to_usd_mode(to_usd);
    if !engine.set_from_amount(amount) {
        bail!("Invalid amount: {}", amount);
    }

    let mut rx = engine.subscribe();
    let state = rx.wait_for(|s| !s.to_recalculating).await?.clone();
    if state.to_amount.is_empty() {
        bail!("Cannot convert {} to {}: price unavailable", from_token.symbol, to_token.symbol);
    }

    let shown = if to_usd {
        format!("${}", state.to_amount)
    } else {
        format!("{} {}", format_token_amount_str(&state.to_amount, 6), to_token.symbol)
    };
    println!("{}", shown);
    println!("Rate:   {}", exchange_rate_label(state.from_token.as_ref(), state.to_token.as_ref()));
    println!(
        "Value:  ${} -> ${} ({})",
        usd_value(&state.from_amount, state.from_token.as_ref(), state.from_usd_mode),
        usd_value(&state.to_amount, state.to_token.as_ref(), state.to_usd_mode),
        price_change_label(&state)
    );
    println!("Source: {}", prices.source.map(|s| s.to_string()).unwrap_or_default());
    Ok(())
}

async fn watch(aggregator: &DefaultAggregator) -> Result<()> {
    let mut rx = aggregator.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                if !state.is_settled() {
                    continue;
                }
                println!("--- {} ---", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"));
                print_prices(&state);
            }
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config, cli.debug)?;
    info!("Configuration loaded successfully.");

    metrics::init()?;

    let aggregator = Arc::new(DefaultAggregator::from_config(&config));
    aggregator.start();

    let outcome = match cli.command.clone().unwrap_or(Command::Prices) {
        Command::Prices => settled_prices(&aggregator).await.map(|state| print_prices(&state)),
        Command::Quote {
            from,
            to,
            amount,
            from_usd,
            to_usd,
        } => quote(&config, &aggregator, &from, &to, &amount, from_usd, to_usd).await,
        Command::Watch => watch(&aggregator).await,
    };

    aggregator.shutdown();

    if cli.metrics {
        print!("{}", metrics::render()?);
    }

    if let Err(e) = &outcome {
        error!("{}", e);
    }
    outcome
}
