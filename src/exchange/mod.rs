#[cfg(test)]
pub mod fixture;
pub mod kucoin;
pub mod traits;

pub use kucoin::KucoinClient;
pub use traits::*;

use tracing::info;

use crate::{config::ExchangeConfig, errors::ExchangeError};

pub const SUPPORTED_EXCHANGES: &[&str] = &["kucoin"];

pub fn create_exchange_client(config: &ExchangeConfig) -> Result<Box<dyn ExchangeClient>, ExchangeError> {
    let key = config.name.trim().to_lowercase();

    match key.as_str() {
        "kucoin" => {
            let client = KucoinClient::new(config.base_url.as_deref());
            info!("Using KuCoin REST API at {}", client.base_url());
            Ok(Box::new(client))
        }
        _ => Err(ExchangeError::Unsupported(format!(
            "{} (supported: {})",
            config.name,
            SUPPORTED_EXCHANGES.join(", ")
        ))),
    }
}
