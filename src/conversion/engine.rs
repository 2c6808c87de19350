use log::{debug, info};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use crate::config::ConversionConfig;
use crate::conversion::ConversionState;
use crate::data;
use crate::error::{Error, Result};
use crate::models::Token;
use crate::validation::sanitize_amount_input;

const DEFAULT_FROM_SYMBOL: &str = "ETH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// `from` edited, recompute `to`.
    Forward,
    /// `to` edited, recompute `from`.
    Reverse,
}

/// Owns the swap form and recomputes the opposite side after each edit.
///
/// Each direction has one pending recompute at most; a newer edit aborts it.
/// The two directions never cancel each other. Must be used inside a Tokio runtime.
pub struct ConversionEngine {
    state: Arc<watch::Sender<ConversionState>>,
    debounce: Duration,
    forward: Mutex<Option<JoinHandle<()>>>,
    reverse: Mutex<Option<JoinHandle<()>>>,
}

impl ConversionEngine {
    pub fn new(debounce: Duration) -> Self {
        let (state, _) = watch::channel(ConversionState::default());
        Self {
            state: Arc::new(state),
            debounce,
            forward: Mutex::new(None),
            reverse: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.debounce())
    }

    pub fn state(&self) -> ConversionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversionState> {
        self.state.subscribe()
    }

    /// Applies a keystroke to the `from` field. Returns `false` if it was rejected.
    pub fn set_from_amount(&self, raw: &str) -> bool {
        let current = self.state.borrow().from_amount.clone();
        let value = match sanitize_amount_input(&current, raw) {
            Some(v) => v,
            None => return false,
        };
        self.state.send_modify(|s| s.from_amount = value);
        self.schedule(Direction::Forward);
        true
    }

    /// Applies a keystroke to the `to` field. Ignored until both tokens are selected.
    pub fn set_to_amount(&self, raw: &str) -> bool {
        let (current, selected) = {
            let s = self.state.borrow();
            (s.to_amount.clone(), s.tokens_selected())
        };
        if !selected {
            return false;
        }
        let value = match sanitize_amount_input(&current, raw) {
            Some(v) => v,
            None => return false,
        };
        self.state.send_modify(|s| s.to_amount = value);
        self.schedule(Direction::Reverse);
        true
    }

    pub fn set_from_token(&self, token: Option<Token>) {
        self.state.send_modify(|s| s.from_token = token);
        self.schedule(Direction::Forward);
    }

    pub fn set_to_token(&self, token: Option<Token>) {
        self.state.send_modify(|s| s.to_token = token);
        self.schedule(Direction::Forward);
    }

    pub fn set_from_usd_mode(&self, enabled: bool) {
        self.state.send_modify(|s| s.from_usd_mode = enabled);
        self.schedule(Direction::Forward);
    }

    pub fn set_to_usd_mode(&self, enabled: bool) {
        self.state.send_modify(|s| s.to_usd_mode = enabled);
        self.schedule(Direction::Forward);
    }

    pub fn can_swap(&self, prices_loading: bool) -> bool {
        !prices_loading && self.state.borrow().tokens_selected()
    }

    /// Exchanges the two sides, then recomputes `to` from the new `from` amount.
    pub fn swap(&self, prices_loading: bool) -> Result<()> {
        if prices_loading {
            return Err(Error::InvalidInput("Cannot swap while prices are loading".to_string()));
        }
        if !self.state.borrow().tokens_selected() {
            return Err(Error::InvalidInput("Select both tokens before swapping".to_string()));
        }

        self.cancel(Direction::Reverse);
        self.state.send_modify(|s| *s = s.swapped());
        info!("Swapped conversion sides");
        self.schedule(Direction::Forward);
        Ok(())
    }

    /// Picks up a fresh price list: selected tokens are re-priced by id and
    /// `from` defaults to ETH the first time tokens arrive.
    pub fn apply_prices(&self, tokens: &[Token]) {
        if tokens.is_empty() {
            return;
        }

        let changed = self.state.send_if_modified(|s| {
            let mut changed = false;
            for slot in [&mut s.from_token, &mut s.to_token] {
                if let Some(selected) = slot {
                    if let Some(fresh) = tokens.iter().find(|t| t.id == selected.id) {
                        if *fresh != *selected {
                            *selected = fresh.clone();
                            changed = true;
                        }
                    }
                }
            }
            if s.from_token.is_none() {
                if let Some(default) = data::find_by_symbol(tokens, DEFAULT_FROM_SYMBOL) {
                    debug!("Defaulting from token to {}", default.symbol);
                    s.from_token = Some(default.clone());
                    changed = true;
                }
            }
            changed
        });

        if changed {
            self.schedule(Direction::Forward);
        }
    }

    fn slot(&self, direction: Direction) -> &Mutex<Option<JoinHandle<()>>> {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Reverse => &self.reverse,
        }
    }

    fn cancel(&self, direction: Direction) {
        if let Ok(mut slot) = self.slot(direction).lock() {
            if let Some(pending) = slot.take() {
                pending.abort();
            }
        }
        self.state.send_modify(|s| match direction {
            Direction::Forward => s.to_recalculating = false,
            Direction::Reverse => s.from_recalculating = false,
        });
    }

    /// Replaces the pending recompute for `direction` with a fresh one.
    ///
    /// An empty or unparsable source amount clears the target immediately.
    fn schedule(&self, direction: Direction) {
        self.cancel(direction);

        let source_amount = {
            let s = self.state.borrow();
            match direction {
                Direction::Forward => s.from_amount.clone(),
                Direction::Reverse => s.to_amount.clone(),
            }
        };
        if source_amount.is_empty() || source_amount.parse::<f64>().is_err() {
            self.state.send_modify(|s| match direction {
                Direction::Forward => s.to_amount.clear(),
                Direction::Reverse => s.from_amount.clear(),
            });
            return;
        }

        self.state.send_modify(|s| match direction {
            Direction::Forward => s.to_recalculating = true,
            Direction::Reverse => s.from_recalculating = true,
        });

        // The edited amount is captured now; tokens and modes are read when the timer fires.
        let state = Arc::clone(&self.state);
        let delay = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.send_modify(|s| match direction {
                Direction::Forward => {
                    s.to_amount = s.forward_of(&source_amount);
                    s.to_recalculating = false;
                }
                Direction::Reverse => {
                    s.from_amount = s.reverse_of(&source_amount);
                    s.from_recalculating = false;
                }
            });
        });

        if let Ok(mut slot) = self.slot(direction).lock() {
            *slot = Some(handle);
        }
    }
}

impl Drop for ConversionEngine {
    fn drop(&mut self) {
        for slot in [&self.forward, &self.reverse] {
            if let Ok(mut slot) = slot.lock() {
                if let Some(pending) = slot.take() {
                    pending.abort();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{create_priced_tokens, create_test_token};
    use tokio_test::{assert_err, assert_ok};

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn engine_with(from: &str, from_price: f64, to: &str, to_price: f64) -> ConversionEngine {
        let engine = ConversionEngine::new(DEBOUNCE);
        engine.set_from_token(Some(create_test_token(from, from_price)));
        engine.set_to_token(Some(create_test_token(to, to_price)));
        engine
    }

    async fn settle() {
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_runs_after_debounce() {
        let engine = engine_with("USDC", 1.0, "ETH", 4307.23);
        assert!(engine.set_from_amount("1000"));

        let pending = engine.state();
        assert!(pending.to_recalculating);
        assert_eq!(pending.to_amount, "");

        settle().await;
        let state = engine.state();
        assert!(!state.to_recalculating);
        assert_eq!(state.to_amount, "0.232168");
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_edit_supersedes_pending_recompute() {
        let engine = engine_with("ETH", 4307.23, "USDC", 1.0);
        engine.set_from_usd_mode(false);

        engine.set_from_amount("1");
        tokio::time::sleep(Duration::from_millis(200)).await;
        engine.set_from_amount("12");

        // 300ms after the first edit only the second one is pending.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(engine.state().to_amount, "");

        settle().await;
        assert_eq!(engine.state().to_amount, "51686.760000");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverse_does_not_cancel_forward() {
        let engine = engine_with("ETH", 4307.23, "USDC", 1.0);
        engine.set_from_usd_mode(false);
        engine.set_from_amount("2");
        engine.set_to_amount("4307.23");

        let pending = engine.state();
        assert!(pending.to_recalculating);
        assert!(pending.from_recalculating);

        settle().await;
        let state = engine.state();
        assert!(!state.to_recalculating);
        assert!(!state.from_recalculating);
        assert_eq!(state.from_amount, "1.000000");
        assert_eq!(state.to_amount, "8614.460000");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_amount_clears_other_side_immediately() {
        let engine = engine_with("ETH", 4307.23, "USDC", 1.0);
        engine.set_from_amount("5");
        settle().await;
        assert!(!engine.state().to_amount.is_empty());

        engine.set_from_amount("");
        let state = engine.state();
        assert_eq!(state.to_amount, "");
        assert!(!state.to_recalculating);
    }

    #[tokio::test]
    async fn test_sanitizes_keystrokes() {
        let engine = ConversionEngine::new(DEBOUNCE);
        assert!(engine.set_from_amount("0"));
        assert!(engine.set_from_amount("05"));
        assert_eq!(engine.state().from_amount, "5");

        assert!(engine.set_from_amount("0"));
        assert!(engine.set_from_amount("."));
        assert_eq!(engine.state().from_amount, "0.");

        assert!(!engine.set_from_amount("1.2.3"));
        assert!(!engine.set_from_amount("abc"));
        assert_eq!(engine.state().from_amount, "0.");
    }

    #[tokio::test]
    async fn test_to_amount_needs_both_tokens() {
        let engine = ConversionEngine::new(DEBOUNCE);
        engine.set_from_token(Some(create_test_token("ETH", 4307.23)));
        assert!(!engine.set_to_amount("5"));
        assert_eq!(engine.state().to_amount, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_swap_exchanges_sides_and_recomputes() {
        let engine = engine_with("ETH", 4307.23, "USDC", 1.0);
        engine.set_from_amount("1000");
        settle().await;

        assert_ok!(engine.swap(false));
        let swapped = engine.state();
        assert_eq!(swapped.from_token.as_ref().unwrap().symbol, "USDC");
        assert_eq!(swapped.from_amount, "1000.000000");
        assert!(!swapped.from_usd_mode);
        assert!(swapped.to_usd_mode);

        settle().await;
        assert_eq!(engine.state().to_amount, "1000.00");
    }

    #[tokio::test]
    async fn test_swap_disabled_while_loading_or_unselected() {
        let engine = ConversionEngine::new(DEBOUNCE);
        assert!(matches!(assert_err!(engine.swap(false)), Error::InvalidInput(_)));

        engine.set_from_token(Some(create_test_token("ETH", 4307.23)));
        engine.set_to_token(Some(create_test_token("USDC", 1.0)));
        assert!(!engine.can_swap(true));
        assert!(matches!(assert_err!(engine.swap(true)), Error::InvalidInput(_)));
        assert!(engine.can_swap(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_prices_defaults_and_reprices() {
        let engine = ConversionEngine::new(DEBOUNCE);
        engine.apply_prices(&create_priced_tokens(&[("ETH", 4000.0), ("USDC", 1.0)]));
        assert_eq!(engine.state().from_token.unwrap().symbol, "ETH");

        engine.set_to_token(Some(create_test_token("USDC", 1.0)));
        engine.set_from_amount("4000");
        settle().await;
        assert_eq!(engine.state().to_amount, "4000.000000");

        engine.apply_prices(&create_priced_tokens(&[("ETH", 5000.0), ("USDC", 1.0)]));
        assert_eq!(engine.state().from_token.unwrap().price, 5000.0);
        settle().await;
        assert_eq!(engine.state().to_amount, "4000.000000");

        engine.set_from_usd_mode(false);
        engine.set_from_amount("1");
        settle().await;
        assert_eq!(engine.state().to_amount, "5000.000000");
    }
}
