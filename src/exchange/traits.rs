use async_trait::async_trait;

use crate::{errors::ExchangeError, types::TickerQuote};

#[async_trait]
pub trait ExchangeClient: Send + Sync {
    fn name(&self) -> &str;

    /// Bulk snapshot of every market, in the order the exchange lists them.
    async fn fetch_tickers(&self) -> Result<Vec<TickerQuote>, ExchangeError>;

    /// Fresh quote for one `BASE/QUOTE` symbol.
    async fn fetch_ticker(&self, symbol: &str) -> Result<TickerQuote, ExchangeError>;
}
