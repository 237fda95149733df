//! Command-line interface definitions.
//!
//! Every path can also be given through an environment variable.

use clap::Parser;
use std::path::PathBuf;

/// Publish product offers as a static HTML site.
///
/// # Examples
///
/// ```sh
/// # Render an existing offer store into ./public
/// offer_site -i ai_products.json -o public
///
/// # Seed the built-in offers first
/// offer_site --seed-fixture
///
/// # Harvest Reddit, generate offers with the LLM, then render
/// offer_site --harvest --generate -c offer_site.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Offer store to render (JSON array of offer records)
    #[arg(short, long, env = "OFFER_SITE_INPUT", default_value = "ai_products.json")]
    pub input: PathBuf,

    /// Directory the site is written to
    #[arg(short, long, env = "OFFER_SITE_OUTPUT", default_value = "public")]
    pub output_dir: PathBuf,

    /// Optional path to a YAML site config
    #[arg(short, long, env = "OFFER_SITE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Abort on the first page that cannot be written
    #[arg(long)]
    pub stop_on_error: bool,

    /// Harvest new leads from Reddit before rendering
    #[arg(long)]
    pub harvest: bool,

    /// Where harvested leads are appended (JSON lines)
    #[arg(long, default_value = "leads_raw.json")]
    pub leads_file: PathBuf,

    /// Generate offers from the leads file with the LLM and replace the offer store
    #[arg(long, conflicts_with = "seed_fixture")]
    pub generate: bool,

    /// Replace the offer store with the built-in example offers
    #[arg(long)]
    pub seed_fixture: bool,
}
