use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best bid/ask for one market, in unified `BASE/QUOTE` notation.
///
/// A price of `0.0` means the exchange did not report one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerQuote {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TickerQuote {
    pub fn new(symbol: impl Into<String>, bid: f64, ask: f64) -> Self {
        Self {
            symbol: symbol.into(),
            bid,
            ask,
            timestamp: None,
        }
    }

    /// Both sides quoted with a usable, positive price.
    pub fn has_liquidity(&self) -> bool {
        self.bid.is_finite() && self.ask.is_finite() && self.bid > 0.0 && self.ask > 0.0
    }

    /// Relative spread `(ask - bid) / bid`, only defined when both sides are quoted.
    pub fn spread(&self) -> Option<f64> {
        if !self.has_liquidity() {
            return None;
        }
        Some((self.ask - self.bid) / self.bid)
    }

    /// Quote currency of a `BASE/QUOTE` symbol.
    pub fn is_quoted_in(&self, quote_currency: &str) -> bool {
        self.symbol
            .strip_suffix(quote_currency)
            .map_or(false, |rest| rest.ends_with('/'))
    }
}

/// A market that passed every filter, ranked by `spread`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub symbol: String,
    pub spread: f64,
}

impl CandidatePair {
    pub fn new(symbol: impl Into<String>, spread: f64) -> Self {
        Self {
            symbol: symbol.into(),
            spread,
        }
    }
}

/// `{"exchange": {"pair_whitelist": [...]}}`, the document the tool writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhitelistDocument {
    #[serde(default)]
    pub exchange: WhitelistSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhitelistSection {
    #[serde(default)]
    pub pair_whitelist: Vec<String>,
}

impl WhitelistDocument {
    pub fn new(pair_whitelist: Vec<String>) -> Self {
        Self {
            exchange: WhitelistSection { pair_whitelist },
        }
    }
}

/// `{"exchange": {"pair_blacklist": [...]}}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlacklistDocument {
    #[serde(default)]
    pub exchange: BlacklistSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlacklistSection {
    #[serde(default)]
    pub pair_blacklist: Vec<String>,
}
