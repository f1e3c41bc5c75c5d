use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    config::Config,
    errors::ExchangeError,
    exchange::ExchangeClient,
    pairs::{blacklist::Blacklist, stats::SelectionStats},
    types::CandidatePair,
};

const PROGRESS_EVERY: usize = 25;

#[derive(Debug, Clone)]
pub struct SelectionCriteria {
    /// Quote currency markets must be denominated in, e.g. `USDT`.
    pub quote_currency: String,
    /// Markets need a spread strictly above this to qualify.
    pub spread_threshold: f64,
    pub max_count: usize,
}

impl From<&Config> for SelectionCriteria {
    fn from(config: &Config) -> Self {
        Self {
            quote_currency: config.quote_currency(),
            spread_threshold: config.selection.spread_threshold,
            max_count: config.selection.max_pairs,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Widest spread first.
    pub pairs: Vec<CandidatePair>,
    pub stats: SelectionStats,
}

impl Selection {
    pub fn symbols(&self) -> Vec<String> {
        self.pairs.iter().map(|p| p.symbol.clone()).collect()
    }
}

pub struct PairSelector<'a> {
    client: &'a dyn ExchangeClient,
}

impl<'a> PairSelector<'a> {
    pub fn new(client: &'a dyn ExchangeClient) -> Self {
        Self { client }
    }

    /// Ranks every `*/{quote}` market by `(ask - bid) / bid` and keeps the
    /// widest `max_count`.
    ///
    /// Quotes are re-fetched one symbol at a time since the bulk snapshot can
    /// be stale. Symbols the exchange reports as invalid are skipped; any
    /// other exchange failure aborts the selection.
    pub async fn select(&self, criteria: &SelectionCriteria, blacklist: &Blacklist) -> Result<Selection> {
        let tickers = self
            .client
            .fetch_tickers()
            .await
            .with_context(|| format!("Failed to fetch tickers from {}", self.client.name()))?;

        let mut stats = SelectionStats {
            markets_scanned: tickers.len(),
            ..Default::default()
        };

        let market_symbols: Vec<String> = tickers
            .into_iter()
            .filter(|ticker| {
                let quoted = ticker.is_quoted_in(&criteria.quote_currency);
                if !quoted {
                    stats.other_quote += 1;
                }
                quoted
            })
            .map(|ticker| ticker.symbol)
            .collect();

        info!(
            "Checking {} {} markets on {}",
            market_symbols.len(),
            criteria.quote_currency,
            self.client.name()
        );

        let mut pairs = Vec::new();
        for (i, symbol) in market_symbols.iter().enumerate() {
            if i > 0 && i % PROGRESS_EVERY == 0 {
                info!("Checked {}/{} markets", i, market_symbols.len());
            }

            if blacklist.is_blacklisted(symbol) {
                stats.blacklisted += 1;
                continue;
            }

            let ticker = match self.client.fetch_ticker(symbol).await {
                Ok(ticker) => ticker,
                Err(ExchangeError::InvalidSymbol(_)) => {
                    debug!("Skipping {}: not available on {}", symbol, self.client.name());
                    stats.invalid_symbol += 1;
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to fetch ticker for {}", symbol));
                }
            };

            let Some(spread) = ticker.spread() else {
                debug!("Skipping {}: bid {} / ask {}", symbol, ticker.bid, ticker.ask);
                stats.no_liquidity += 1;
                continue;
            };

            if spread <= criteria.spread_threshold {
                debug!("Skipping {}: spread {:.6} at or below threshold", symbol, spread);
                stats.below_threshold += 1;
                continue;
            }

            debug!("Candidate {} with spread {:.6}", symbol, spread);
            pairs.push(CandidatePair::new(symbol.as_str(), spread));
        }

        stats.ranked = pairs.len();
        rank_by_spread(&mut pairs, criteria.max_count);
        stats.selected = pairs.len();

        Ok(Selection { pairs, stats })
    }
}

/// Widest spread first, discovery order on ties, at most `max_count` kept.
pub fn rank_by_spread(pairs: &mut Vec<CandidatePair>, max_count: usize) {
    // sort_by is stable
    pairs.sort_by(|a, b| b.spread.total_cmp(&a.spread));
    pairs.truncate(max_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::fixture::FixtureExchange;

    fn criteria(max_count: usize) -> SelectionCriteria {
        SelectionCriteria {
            quote_currency: "USDT".to_string(),
            spread_threshold: 0.001,
            max_count,
        }
    }

    #[tokio::test]
    async fn test_select_applies_every_filter() {
        let exchange = FixtureExchange::new()
            .with_market("AAA/USDT", 1.00, 1.05) // 5%
            .with_market("BBB/USDT", 100.0, 100.05) // 0.05%, below threshold
            .with_market("CCC/BTC", 1.00, 1.50) // other quote
            .with_market("DDD/USDT", 0.0, 2.0) // no bid
            .with_market("BNB/USDT", 1.00, 1.20) // blacklisted
            .with_delisted("EEE/USDT")
            .with_market("FFF/USDT", 2.00, 2.02); // 1%
        let blacklist = Blacklist::from_entries(["BNB/*"]);

        let selection = PairSelector::new(&exchange)
            .select(&criteria(10), &blacklist)
            .await
            .unwrap();

        assert_eq!(selection.symbols(), vec!["AAA/USDT", "FFF/USDT"]);
        assert!((selection.pairs[0].spread - 0.05).abs() < 1e-9);

        let stats = &selection.stats;
        assert_eq!(stats.markets_scanned, 7);
        assert_eq!(stats.other_quote, 1);
        assert_eq!(stats.blacklisted, 1);
        assert_eq!(stats.invalid_symbol, 1);
        assert_eq!(stats.no_liquidity, 1);
        assert_eq!(stats.below_threshold, 1);
        assert_eq!(stats.ranked, 2);
        assert_eq!(stats.selected, 2);

        // blacklisted and off-market symbols never cost a request
        let requested = exchange.requested();
        assert!(!requested.contains(&"BNB/USDT".to_string()));
        assert!(!requested.contains(&"CCC/BTC".to_string()));
        assert_eq!(requested.len(), 5);
    }

    #[tokio::test]
    async fn test_select_sorts_and_truncates() {
        let exchange = FixtureExchange::new()
            .with_market("A/USDT", 1.0, 1.01)
            .with_market("B/USDT", 1.0, 1.03)
            .with_market("C/USDT", 1.0, 1.02)
            .with_market("D/USDT", 1.0, 1.03);

        let selection = PairSelector::new(&exchange)
            .select(&criteria(3), &Blacklist::default())
            .await
            .unwrap();

        // B and D tie; B was discovered first
        assert_eq!(selection.symbols(), vec!["B/USDT", "D/USDT", "C/USDT"]);
        assert_eq!(selection.stats.ranked, 4);
        assert_eq!(selection.stats.selected, 3);
    }

    #[tokio::test]
    async fn test_spread_equal_to_threshold_is_excluded() {
        let exchange = FixtureExchange::new().with_market("A/USDT", 1.0, 1.5);
        let criteria = SelectionCriteria {
            quote_currency: "USDT".to_string(),
            spread_threshold: 0.5,
            max_count: 10,
        };

        let selection = PairSelector::new(&exchange)
            .select(&criteria, &Blacklist::default())
            .await
            .unwrap();
        assert!(selection.pairs.is_empty());
        assert_eq!(selection.stats.below_threshold, 1);
    }

    #[tokio::test]
    async fn test_exchange_failure_aborts() {
        let exchange = FixtureExchange::new()
            .with_market("A/USDT", 1.0, 1.1)
            .with_failing("B/USDT")
            .with_market("C/USDT", 1.0, 1.1);

        let err = PairSelector::new(&exchange)
            .select(&criteria(10), &Blacklist::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ExchangeError>(),
            Some(ExchangeError::Api { .. })
        ));
        // nothing after the failing symbol is requested
        assert_eq!(exchange.requested(), vec!["A/USDT", "B/USDT"]);

        let exchange = FixtureExchange::new().with_snapshot_failure();
        assert!(PairSelector::new(&exchange)
            .select(&criteria(10), &Blacklist::default())
            .await
            .is_err());
    }

    #[test]
    fn test_rank_by_spread_zero_count() {
        let mut pairs = vec![CandidatePair::new("A/USDT", 0.2)];
        rank_by_spread(&mut pairs, 0);
        assert!(pairs.is_empty());
    }
}
