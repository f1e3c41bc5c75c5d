use anyhow::{Context, Result};
use clap::Parser;
use spread_pairlist::{
    app::PairlistGenerator,
    config::{Config, Overrides},
    pairs::{ReconcileOutcome, StdinConfirmer},
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info, Level};

/// Builds an exchange pair whitelist from the widest bid/ask spreads
#[derive(Parser)]
#[command(name = "spread-pairlist")]
struct Args {
    /// Exchange to query (kucoin)
    #[arg(short, long)]
    exchange: Option<String>,

    /// Quote currency the pairs must trade against, e.g. USDT
    #[arg(short, long)]
    market: Option<String>,

    /// Minimum relative spread, exclusive (0.001 = 0.1%)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Maximum number of pairs to keep
    #[arg(short = 'n', long)]
    max_pairs: Option<usize>,

    /// Directory holding the _<exchange>-blacklist.json / -default.json files
    #[arg(long)]
    pairs_dir: Option<PathBuf>,

    /// Settings file to use instead of config/default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every skipped market
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            exchange: self.exchange.clone(),
            quote_currency: self.market.clone(),
            spread_threshold: self.threshold,
            max_pairs: self.max_pairs,
            pairs_dir: self.pairs_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // stdout carries the whitelist diff and prompt, logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting spread pairlist generator");

    if report(run(&args).await) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(args: &Args) -> Result<ReconcileOutcome> {
    let config = Config::load(args.config.as_deref(), &args.overrides())
        .context("Failed to load configuration")?;

    let generator =
        PairlistGenerator::new(config).context("Failed to initialize exchange client")?;
    info!(
        "Blacklist: {}, whitelist: {}",
        generator.config().blacklist_path().display(),
        generator.config().whitelist_path().display()
    );

    let outcome = generator
        .run(StdinConfirmer, &mut std::io::stdout())
        .await
        .context("Pairlist generation failed")?;
    Ok(outcome.reconcile)
}

/// Logs how the run ended, once. Returns whether it counts as a success.
fn report(result: Result<ReconcileOutcome>) -> bool {
    match result {
        Ok(ReconcileOutcome::Written { path, backup, count }) => {
            if let Some(backup) = backup {
                info!("Previous whitelist kept at {}", backup.display());
            }
            info!("Whitelist of {} pairs saved to {}", count, path.display());
            true
        }
        Ok(ReconcileOutcome::Declined) => {
            info!("Whitelist left unchanged");
            true
        }
        Err(e) => {
            error!("{:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::{path::PathBuf, process::ExitCode};

    #[test]
    fn test_report_exit_status() {
        assert!(report(Ok(ReconcileOutcome::Declined)));
        assert!(report(Ok(ReconcileOutcome::Written {
            path: PathBuf::from("pairs/_kucoin-default.json"),
            backup: None,
            count: 3,
        })));
        assert!(!report(Err(anyhow!("malformed blacklist"))));
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from(["spread-pairlist", "-m", "btc", "-t", "0.01", "-n", "20", "-v"]);
        let overrides = args.overrides();

        assert_eq!(overrides.quote_currency.as_deref(), Some("btc"));
        assert_eq!(overrides.spread_threshold, Some(0.01));
        assert_eq!(overrides.max_pairs, Some(20));
        assert!(overrides.exchange.is_none());
        assert!(args.verbose);
    }
}
