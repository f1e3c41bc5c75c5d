use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config/default";
pub const ENV_PREFIX: &str = "PAIRLIST";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub selection: SelectionConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeConfig {
    pub name: String,
    /// REST endpoint override; the client's public endpoint is used when unset.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SelectionConfig {
    pub quote_currency: String,
    pub spread_threshold: f64,
    pub max_pairs: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    pub pairs_dir: PathBuf,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub exchange: Option<String>,
    pub quote_currency: Option<String>,
    pub spread_threshold: Option<f64>,
    pub max_pairs: Option<usize>,
    pub pairs_dir: Option<PathBuf>,
}

impl Config {
    /// Defaults, then `config/default` (or `config_file`), then `PAIRLIST_*`
    /// environment variables, then command line overrides.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        dotenv::dotenv().ok();

        let file_source = match config_file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut settings = config::Config::builder()
            .set_default("exchange.name", "kucoin")?
            .set_default("selection.quote_currency", "USDT")?
            .set_default("selection.spread_threshold", 0.001)?
            .set_default("selection.max_pairs", 250_i64)?
            .set_default("paths.pairs_dir", "./user_data/config/pairs")?
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(exchange) = &overrides.exchange {
            settings = settings.set_override("exchange.name", exchange.as_str())?;
        }
        if let Some(quote) = &overrides.quote_currency {
            settings = settings.set_override("selection.quote_currency", quote.as_str())?;
        }
        if let Some(threshold) = overrides.spread_threshold {
            settings = settings.set_override("selection.spread_threshold", threshold)?;
        }
        if let Some(max_pairs) = overrides.max_pairs {
            settings = settings.set_override("selection.max_pairs", max_pairs as i64)?;
        }
        if let Some(dir) = &overrides.pairs_dir {
            settings = settings.set_override("paths.pairs_dir", dir.to_string_lossy().into_owned())?;
        }

        let config: Config = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.exchange.name.trim().is_empty() {
            return Err(anyhow!("exchange.name must not be empty"));
        }
        if self.selection.quote_currency.trim().is_empty() {
            return Err(anyhow!("selection.quote_currency must not be empty"));
        }
        let threshold = self.selection.spread_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(anyhow!(
                "selection.spread_threshold must be a non-negative number, got {}",
                threshold
            ));
        }
        Ok(())
    }

    /// Lower-cased exchange name used in file names.
    pub fn exchange_key(&self) -> String {
        self.exchange.name.trim().to_lowercase()
    }

    pub fn quote_currency(&self) -> String {
        self.selection.quote_currency.trim().to_uppercase()
    }

    /// `{pairs_dir}/_{exchange}-blacklist.json`
    pub fn blacklist_path(&self) -> PathBuf {
        self.paths
            .pairs_dir
            .join(format!("_{}-blacklist.json", self.exchange_key()))
    }

    /// `{pairs_dir}/_{exchange}-default.json`
    pub fn whitelist_path(&self) -> PathBuf {
        self.paths
            .pairs_dir
            .join(format!("_{}-default.json", self.exchange_key()))
    }
}
