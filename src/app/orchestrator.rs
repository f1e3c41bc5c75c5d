use anyhow::Result;
use std::io::Write;
use tracing::info;

use crate::{
    config::Config,
    exchange::{create_exchange_client, ExchangeClient},
    pairs::{
        load_blacklist, Confirmer, PairSelector, ReconcileOutcome, Selection, SelectionCriteria,
        WhitelistReconciler,
    },
};

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub selection: Selection,
    pub reconcile: ReconcileOutcome,
}

/// One blacklist -> selection -> whitelist pass for the configured exchange.
pub struct PairlistGenerator {
    config: Config,
    client: Box<dyn ExchangeClient>,
}

impl PairlistGenerator {
    pub fn new(config: Config) -> Result<Self> {
        let client = create_exchange_client(&config.exchange)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: Config, client: Box<dyn ExchangeClient>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run<C: Confirmer>(&self, confirmer: C, out: &mut impl Write) -> Result<RunOutcome> {
        // a broken blacklist must stop the run before any request goes out
        let blacklist = load_blacklist(&self.config.blacklist_path())?;

        let criteria = SelectionCriteria::from(&self.config);
        info!(
            "Selecting up to {} {} pairs on {} with spread above {}",
            criteria.max_count,
            criteria.quote_currency,
            self.client.name(),
            criteria.spread_threshold
        );

        let selection = PairSelector::new(self.client.as_ref())
            .select(&criteria, &blacklist)
            .await?;
        selection.stats.log_summary(&criteria.quote_currency);

        let mut reconciler = WhitelistReconciler::new(self.config.whitelist_path(), confirmer);
        let reconcile = reconciler.reconcile(&selection.pairs, out)?;

        Ok(RunOutcome {
            selection,
            reconcile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ExchangeConfig, PathsConfig, SelectionConfig},
        errors::DocumentError,
        exchange::fixture::FixtureExchange,
        pairs::{reconciler::load_whitelist, ScriptedConfirmer},
    };
    use std::{fs, path::Path};
    use tempfile::tempdir;

    fn create_test_config(pairs_dir: &Path) -> Config {
        Config {
            exchange: ExchangeConfig {
                name: "kucoin".to_string(),
                base_url: None,
            },
            selection: SelectionConfig {
                quote_currency: "USDT".to_string(),
                spread_threshold: 0.001,
                max_pairs: 2,
            },
            paths: PathsConfig {
                pairs_dir: pairs_dir.to_path_buf(),
            },
        }
    }

    fn create_test_exchange() -> FixtureExchange {
        FixtureExchange::new()
            .with_market("AAA/USDT", 1.0, 1.02)
            .with_market("BBB/USDT", 1.0, 1.05)
            .with_market("CCC/USDT", 1.0, 1.03)
            .with_market("BNB/USDT", 1.0, 1.50)
            .with_delisted("OLD/USDT")
    }

    #[tokio::test]
    async fn test_run_writes_ranked_whitelist() {
        let dir = tempdir().unwrap();
        let config = create_test_config(dir.path());
        fs::write(
            config.blacklist_path(),
            r#"{"exchange": {"pair_blacklist": ["BNB/*"]}}"#,
        )
        .unwrap();
        fs::write(
            config.whitelist_path(),
            r#"{"exchange": {"pair_whitelist": ["AAA/USDT"]}}"#,
        )
        .unwrap();

        let generator = PairlistGenerator::with_client(config.clone(), Box::new(create_test_exchange()));
        let outcome = generator
            .run(ScriptedConfirmer::new(["y"]), &mut std::io::sink())
            .await
            .unwrap();

        assert_eq!(outcome.selection.symbols(), vec!["BBB/USDT", "CCC/USDT"]);
        assert_eq!(outcome.selection.stats.blacklisted, 1);
        assert_eq!(outcome.selection.stats.invalid_symbol, 1);
        assert!(matches!(
            outcome.reconcile,
            ReconcileOutcome::Written { backup: Some(_), count: 2, .. }
        ));
        assert_eq!(
            load_whitelist(&config.whitelist_path()).unwrap(),
            vec!["BBB/USDT", "CCC/USDT"]
        );
    }

    #[tokio::test]
    async fn test_run_declined_changes_nothing() {
        let dir = tempdir().unwrap();
        let config = create_test_config(dir.path());

        let generator = PairlistGenerator::with_client(config.clone(), Box::new(create_test_exchange()));
        let outcome = generator
            .run(ScriptedConfirmer::new(["n"]), &mut std::io::sink())
            .await
            .unwrap();

        assert_eq!(outcome.reconcile, ReconcileOutcome::Declined);
        assert!(!config.whitelist_path().exists());
    }

    #[tokio::test]
    async fn test_malformed_blacklist_stops_before_exchange() {
        let dir = tempdir().unwrap();
        let config = create_test_config(dir.path());
        fs::write(config.blacklist_path(), r#"{"exchange": {"pair_blacklist": ["#).unwrap();

        // the exchange would fail too; the blacklist error must win
        let exchange = FixtureExchange::new().with_snapshot_failure();
        let generator = PairlistGenerator::with_client(config, Box::new(exchange));
        let err = generator
            .run(ScriptedConfirmer::new(["y"]), &mut std::io::sink())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DocumentError>(),
            Some(DocumentError::Malformed { line: 1, .. })
        ));
    }
}
