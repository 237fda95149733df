//! # Offer Site
//!
//! Finds people asking for help online, turns their problems into product
//! offers, and publishes the offers as a small static HTML site.
//!
//! ## Usage
//!
//! ```sh
//! offer_site -i ai_products.json -o public
//! ```
//!
//! ## Architecture
//!
//! The application is a linear pipeline; the first two steps are optional:
//! 1. **Harvesting**: scan subreddits for posts matching pain-point keywords
//!    and append them to the leads file
//! 2. **Generating**: ask an LLM for a product idea per lead and write the
//!    offer store (or seed it with the built-in offers)
//! 3. **Rendering**: load the offer store, write one page per valid offer and
//!    an index linking them, and remove pages left over from earlier runs
//!
//! ## Exit codes
//!
//! - `0`: the site was built, possibly with skipped offers
//! - `1`: fatal error (unreadable offer store, invalid config, ...)
//! - `2`: the index page could not be written

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod generator;
mod models;
mod offers;
mod outputs;
mod pipeline;
mod scrapers;
mod store;
mod utils;

use cli::Cli;
use config::{SiteConfig, load_config};
use error::StoreError;
use generator::{LlmSetup, fixture_offers, refresh_offer_store};
use models::Lead;
use pipeline::{Pipeline, RunReport};
use scrapers::reddit::{Harvester, load_leads, save_leads};
use std::path::Path;
use store::save_offers;

const EXIT_FATAL: u8 = 1;
const EXIT_INDEX_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let result = run(args).await;
    match &result {
        Ok(report) => {
            if let Some(reason) = &report.index_error {
                error!(%reason, "Site has no index page");
            }
        }
        Err(e) => error!(error = %e, "Fatal error"),
    }
    ExitCode::from(exit_status(&result))
}

/// Process exit status for a finished run.
fn exit_status(result: &Result<RunReport, Box<dyn Error>>) -> u8 {
    match result {
        Ok(report) if report.index_error.is_some() => EXIT_INDEX_FAILED,
        Ok(_) => 0,
        Err(_) => EXIT_FATAL,
    }
}

#[instrument(level = "info", skip_all)]
async fn run(args: Cli) -> Result<RunReport, Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!("offer_site starting up");

    let config = load_config(args.config.as_deref())?;

    // ---- Harvest leads ----
    if args.harvest {
        let harvester = Harvester::new(&config.harvest)?;
        let outcome = harvester.harvest().await;
        for failure in &outcome.failures {
            warn!(subreddit = %failure.subreddit, reason = %failure.reason, "Source skipped");
        }
        if outcome.leads.is_empty() {
            info!("No new leads found");
        } else {
            save_leads(&args.leads_file, &outcome.leads).await?;
        }
    }

    // ---- Fill the offer store ----
    fill_offer_store(&args, &config).await?;

    // ---- Render the site ----
    let mut pipeline = Pipeline::new(&config, &args.input, &args.output_dir)
        .stop_on_error(args.stop_on_error);
    let report = pipeline.run().await?;

    if report.nothing_to_render {
        info!("Nothing to render; published an empty index");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        loaded = report.loaded,
        rendered = report.rendered,
        linked = report.manifest.len(),
        skipped = report.skipped,
        write_failures = report.write_failures,
        "Execution complete"
    );
    Ok(report)
}

/// Replace the offer store from the leads file (`--generate`) or with the
/// built-in offers (`--seed-fixture`). Without either flag the store is left
/// as it is.
async fn fill_offer_store(args: &Cli, config: &SiteConfig) -> Result<(), Box<dyn Error>> {
    if args.generate {
        let leads = read_leads(&args.leads_file).await?;
        if leads.is_empty() {
            warn!("No leads to generate offers from; keeping the existing offer store");
            return Ok(());
        }
        let setup = LlmSetup::load(&config.generator).await?;
        let api = setup.client(&config.generator);
        refresh_offer_store(&api, &leads, &args.input).await?;
    } else if args.seed_fixture {
        save_offers(&args.input, &fixture_offers()).await?;
        info!(path = %args.input.display(), "Seeded offer store with built-in offers");
    }
    Ok(())
}

/// Leads from the leads file; a missing file means no leads yet.
async fn read_leads(path: &Path) -> Result<Vec<Lead>, StoreError> {
    match load_leads(path).await {
        Ok(leads) => Ok(leads),
        Err(StoreError::Missing { path }) => {
            warn!(path = %path.display(), "No leads file found");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::store::load_offers;
    use tempfile::TempDir;

    fn cli(tmp: &TempDir, flags: &[&str]) -> Cli {
        let input = tmp.path().join("ai_products.json");
        let output = tmp.path().join("public");
        let leads = tmp.path().join("leads_raw.json");
        let mut argv = vec![
            "offer_site".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
            "--leads-file".to_string(),
            leads.display().to_string(),
        ];
        argv.extend(flags.iter().map(|f| f.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_exit_status_success() {
        let report = RunReport {
            skipped: 2,
            index_written: true,
            ..RunReport::default()
        };
        assert_eq!(exit_status(&Ok(report)), 0);
    }

    #[test]
    fn test_exit_status_index_failed() {
        let report = RunReport {
            index_error: Some("permission denied writing public/index.html".to_string()),
            ..RunReport::default()
        };
        assert_eq!(exit_status(&Ok(report)), 2);
    }

    #[test]
    fn test_exit_status_fatal() {
        let err = PipelineError::Store(StoreError::Missing {
            path: "ai_products.json".into(),
        });
        assert_eq!(exit_status(&Err(err.into())), 1);
    }

    #[tokio::test]
    async fn test_seed_fixture_writes_store() {
        let tmp = TempDir::new().unwrap();
        let args = cli(&tmp, &["--seed-fixture"]);

        fill_offer_store(&args, &SiteConfig::default()).await.unwrap();

        let offers = load_offers(&args.input).await.unwrap();
        assert_eq!(offers, fixture_offers());
    }

    #[tokio::test]
    async fn test_generate_without_leads_file_keeps_store() {
        let tmp = TempDir::new().unwrap();
        let args = cli(&tmp, &["--generate"]);
        save_offers(&args.input, &fixture_offers()).await.unwrap();
        let before = std::fs::read(&args.input).unwrap();

        fill_offer_store(&args, &SiteConfig::default()).await.unwrap();

        assert_eq!(std::fs::read(&args.input).unwrap(), before);
    }

    #[tokio::test]
    async fn test_read_leads_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let leads = read_leads(&tmp.path().join("absent.json")).await.unwrap();
        assert!(leads.is_empty());
    }

    #[tokio::test]
    async fn test_no_store_flags_leave_store_alone() {
        let tmp = TempDir::new().unwrap();
        let args = cli(&tmp, &[]);

        fill_offer_store(&args, &SiteConfig::default()).await.unwrap();

        assert!(!args.input.exists());
    }
}
