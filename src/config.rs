//! Site, harvester and generator configuration.
//!
//! Configuration is loaded from an optional YAML file. Every section and field
//! has a default, so a file only needs to contain the values it overrides:
//!
//! ```yaml
//! site:
//!   contact_email: hello@example.com
//!   payment_link: https://paypal.me/example
//! harvest:
//!   subreddits: ["r/SaaS"]
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Top-level configuration passed into the pipeline and collaborators.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub harvest: HarvestSection,
    pub generator: GeneratorSection,
}

/// Fixed text and links embedded into every rendered page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteSection {
    /// `<title>` of the index page.
    pub title: String,
    /// Main heading of the index page.
    pub headline: String,
    pub tagline: String,
    pub contact_email: String,
    /// Where every call-to-action points.
    pub payment_link: String,
    /// Label of the call-to-action on detail pages.
    pub buy_label: String,
    /// Label of the call-to-action on the index page.
    pub bundle_label: String,
    /// Shown on the index page when there is nothing to list.
    pub empty_message: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "AI Product Bundle".to_string(),
            headline: "Exclusive AI Productivity Toolkit".to_string(),
            tagline: "Access all tools in one discounted bundle.".to_string(),
            contact_email: "GPTAutomation@proton.me".to_string(),
            payment_link: "https://paypal.me/GPTAutomation".to_string(),
            buy_label: "Buy Now via PayPal".to_string(),
            bundle_label: "Get the Full Bundle Now".to_string(),
            empty_message: "No offers yet. Check back soon.".to_string(),
        }
    }
}

/// Where and how to look for pain points.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HarvestSection {
    pub base_url: String,
    pub subreddits: Vec<String>,
    /// Case-insensitive phrases that mark a post as a lead.
    pub keywords: Vec<String>,
    pub user_agent: String,
    pub post_limit: u32,
    pub timeout_secs: u64,
    /// How much of the post body to keep on a lead, in characters.
    pub details_max_chars: usize,
}

impl Default for HarvestSection {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            subreddits: vec![
                "r/Entrepreneur".to_string(),
                "r/freelance".to_string(),
                "r/AItools".to_string(),
                "r/startups".to_string(),
            ],
            keywords: vec![
                "how do i".to_string(),
                "any tools".to_string(),
                "please help".to_string(),
                "is there a way".to_string(),
            ],
            user_agent: "Mozilla/5.0".to_string(),
            post_limit: 20,
            timeout_secs: 20,
            details_max_chars: 250,
        }
    }
}

impl HarvestSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// LLM settings for turning leads into offers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// Name of the `awful_aj` chat template to use.
    pub template: String,
    /// Path to the `awful_aj` config.yaml; defaults to its config directory.
    pub aj_config: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub base_delay_ms: u64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            template: "offer_generator".to_string(),
            aj_config: None,
            timeout_secs: 120,
            max_retries: 5,
            base_delay_ms: 1000,
        }
    }
}

impl GeneratorSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Load configuration from `path`, or the defaults when `path` is `None`.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let config = parse_config(&content)?;
            info!(path = %path.display(), "Loaded site configuration");
            config
        }
        None => {
            info!("No config file given; using built-in defaults");
            SiteConfig::default()
        }
    };
    validate(&config)?;
    Ok(config)
}

/// Parse YAML into a [`SiteConfig`]. An empty document yields the defaults.
pub fn parse_config(content: &str) -> Result<SiteConfig, ConfigError> {
    if content.trim().is_empty() {
        return Ok(SiteConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Check the values that would otherwise produce a broken site or a run that
/// can never succeed.
pub fn validate(config: &SiteConfig) -> Result<(), ConfigError> {
    let link = Url::parse(&config.site.payment_link).map_err(|e| {
        ConfigError::Validation(format!(
            "site.payment_link {:?} is not a valid URL: {}",
            config.site.payment_link, e
        ))
    })?;
    if !matches!(link.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "site.payment_link must use http or https, got {:?}",
            link.scheme()
        )));
    }

    if !config.site.contact_email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "site.contact_email {:?} is not an e-mail address",
            config.site.contact_email
        )));
    }

    if config.harvest.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "harvest.keywords must contain at least one keyword".to_string(),
        ));
    }

    Url::parse(&config.harvest.base_url).map_err(|e| {
        ConfigError::Validation(format!("harvest.base_url is not a valid URL: {}", e))
    })?;

    if config.harvest.timeout_secs == 0 || config.generator.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    Ok(())
}
