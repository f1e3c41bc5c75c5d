use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::{errors::ExchangeError, exchange::traits::ExchangeClient, types::TickerQuote};

pub const KUCOIN_REST_ENDPOINT: &str = "https://api.kucoin.com";

const SUCCESS_CODE: &str = "200000";
/// Codes KuCoin answers with when a trading pair does not exist.
const INVALID_SYMBOL_CODES: &[&str] = &["400100", "900001"];

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct AllTickers {
    #[serde(default)]
    time: Option<i64>,
    ticker: Vec<MarketTicker>,
}

#[derive(Debug, Deserialize)]
struct MarketTicker {
    symbol: String,
    #[serde(default)]
    buy: Option<String>,
    #[serde(default)]
    sell: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Level1 {
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    best_bid: Option<String>,
    #[serde(default)]
    best_ask: Option<String>,
}

pub struct KucoinClient {
    http: Client,
    base_url: String,
}

impl KucoinClient {
    pub fn new(base_url: Option<&str>) -> Self {
        let base_url = base_url
            .unwrap_or(KUCOIN_REST_ENDPOINT)
            .trim_end_matches('/')
            .to_string();

        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, ExchangeError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        decode_envelope(status.is_success(), status.as_u16(), &body)
    }
}

#[async_trait]
impl ExchangeClient for KucoinClient {
    fn name(&self) -> &str {
        "kucoin"
    }

    async fn fetch_tickers(&self) -> Result<Vec<TickerQuote>, ExchangeError> {
        debug!("Fetching all KuCoin tickers from {}", self.base_url);
        let envelope = self
            .get::<AllTickers>("/api/v1/market/allTickers", &[])
            .await?;
        tickers_from_envelope(envelope)
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<TickerQuote, ExchangeError> {
        let market_id = to_market_id(symbol)?;
        let envelope = self
            .get::<Level1>("/api/v1/market/orderbook/level1", &[("symbol", market_id.as_str())])
            .await?;
        ticker_from_envelope(symbol, envelope)
    }
}

fn decode_envelope<T: DeserializeOwned>(
    success: bool,
    status: u16,
    body: &str,
) -> Result<Envelope<T>, ExchangeError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => Ok(envelope),
        Err(e) if success => Err(e.into()),
        Err(_) => Err(ExchangeError::Api {
            code: status.to_string(),
            message: body.chars().take(200).collect(),
        }),
    }
}

fn tickers_from_envelope(envelope: Envelope<AllTickers>) -> Result<Vec<TickerQuote>, ExchangeError> {
    if envelope.code != SUCCESS_CODE {
        return Err(api_error(envelope.code, envelope.msg));
    }
    let Some(data) = envelope.data else {
        return Err(api_error(envelope.code, Some("empty ticker snapshot".to_string())));
    };

    let timestamp = data.time.and_then(millis_to_datetime);
    data.ticker
        .into_iter()
        .map(|raw| {
            Ok(TickerQuote {
                symbol: to_unified_symbol(&raw.symbol),
                bid: parse_price("buy", raw.buy.as_deref())?,
                ask: parse_price("sell", raw.sell.as_deref())?,
                timestamp,
            })
        })
        .collect()
}

fn ticker_from_envelope(symbol: &str, envelope: Envelope<Level1>) -> Result<TickerQuote, ExchangeError> {
    if INVALID_SYMBOL_CODES.contains(&envelope.code.as_str()) {
        return Err(ExchangeError::InvalidSymbol(symbol.to_string()));
    }
    if envelope.code != SUCCESS_CODE {
        return Err(api_error(envelope.code, envelope.msg));
    }
    // KuCoin answers unknown pairs with a successful, empty payload
    let Some(level1) = envelope.data else {
        return Err(ExchangeError::InvalidSymbol(symbol.to_string()));
    };

    Ok(TickerQuote {
        symbol: symbol.to_string(),
        bid: parse_price("bestBid", level1.best_bid.as_deref())?,
        ask: parse_price("bestAsk", level1.best_ask.as_deref())?,
        timestamp: level1.time.and_then(millis_to_datetime),
    })
}

fn api_error(code: String, msg: Option<String>) -> ExchangeError {
    ExchangeError::Api {
        code,
        message: msg.unwrap_or_default(),
    }
}

/// Missing prices are reported as `0.0`.
fn parse_price(field: &'static str, raw: Option<&str>) -> Result<f64, ExchangeError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(value) => value.parse::<f64>().map_err(|_| ExchangeError::Number {
            field,
            value: value.to_string(),
        }),
    }
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// `BTC-USDT` -> `BTC/USDT`
pub fn to_unified_symbol(market_id: &str) -> String {
    market_id.replacen('-', "/", 1)
}

/// `BTC/USDT` -> `BTC-USDT`
pub fn to_market_id(symbol: &str) -> Result<String, ExchangeError> {
    match symbol.split_once('/') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
            Ok(format!("{}-{}", base, quote))
        }
        _ => Err(ExchangeError::InvalidSymbol(symbol.to_string())),
    }
}
