use serde::{Deserialize, Serialize};
use tracing::info;

/// Why markets dropped out of one selection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionStats {
    pub markets_scanned: usize,
    pub other_quote: usize,
    pub blacklisted: usize,
    pub invalid_symbol: usize,
    pub no_liquidity: usize,
    pub below_threshold: usize,
    /// Passed every filter, before truncation.
    pub ranked: usize,
    pub selected: usize,
}

impl SelectionStats {
    /// Markets that cost a per-symbol request.
    pub fn refetched(&self) -> usize {
        self.invalid_symbol + self.no_liquidity + self.below_threshold + self.ranked
    }

    pub fn log_summary(&self, quote_currency: &str) {
        info!(
            "Scanned {} markets: {} not quoted in {}, {} blacklisted, {} invalid, {} without liquidity, {} below spread threshold",
            self.markets_scanned,
            self.other_quote,
            quote_currency,
            self.blacklisted,
            self.invalid_symbol,
            self.no_liquidity,
            self.below_threshold
        );
        info!(
            "{} pairs passed all filters after {} ticker requests, keeping top {}",
            self.ranked,
            self.refetched(),
            self.selected
        );
    }
}
