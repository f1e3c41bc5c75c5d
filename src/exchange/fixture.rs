//! In-memory exchange used by the selector and orchestrator tests.

use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use crate::{errors::ExchangeError, exchange::traits::ExchangeClient, types::TickerQuote};

#[derive(Default)]
pub struct FixtureExchange {
    snapshot: Vec<TickerQuote>,
    live: HashMap<String, TickerQuote>,
    failing: HashSet<String>,
    snapshot_fails: bool,
    requests: Mutex<Vec<String>>,
}

impl FixtureExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listed in the bulk snapshot with a stale quote, answered with `bid`/`ask`.
    pub fn with_market(mut self, symbol: &str, bid: f64, ask: f64) -> Self {
        self.snapshot.push(TickerQuote::new(symbol, 0.0, 0.0));
        self.live
            .insert(symbol.to_string(), TickerQuote::new(symbol, bid, ask));
        self
    }

    /// Listed in the bulk snapshot but unknown to the per-symbol endpoint.
    pub fn with_delisted(mut self, symbol: &str) -> Self {
        self.snapshot.push(TickerQuote::new(symbol, 1.0, 1.1));
        self
    }

    /// Listed in the bulk snapshot; the per-symbol request fails hard.
    pub fn with_failing(mut self, symbol: &str) -> Self {
        self.snapshot.push(TickerQuote::new(symbol, 1.0, 1.1));
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn with_snapshot_failure(mut self) -> Self {
        self.snapshot_fails = true;
        self
    }

    /// Symbols requested through `fetch_ticker`, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ExchangeClient for FixtureExchange {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn fetch_tickers(&self) -> Result<Vec<TickerQuote>, ExchangeError> {
        if self.snapshot_fails {
            return Err(ExchangeError::Api {
                code: "503000".to_string(),
                message: "Service unavailable".to_string(),
            });
        }
        Ok(self.snapshot.clone())
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<TickerQuote, ExchangeError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(symbol.to_string());
        }
        if self.failing.contains(symbol) {
            return Err(ExchangeError::Api {
                code: "429000".to_string(),
                message: "Too Many Requests".to_string(),
            });
        }
        self.live
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::InvalidSymbol(symbol.to_string()))
    }
}
