//! Turning leads into offer records.
//!
//! Each lead's pain point is sent to the LLM with a fixed instruction asking
//! for a product idea, a one-line description and a monetization suggestion,
//! as JSON. The reply is stored verbatim (minus a surrounding code fence) in
//! [`OfferRecord::solution`]; whether it is usable is decided later by the
//! offer parser, so a bad reply costs one page, not the run.

use crate::api::{AskAsync, AskFnWrapper, RetryAsk, ask_with_backoff};
use crate::config::GeneratorSection;
use crate::error::StoreError;
use crate::models::{Lead, OfferRecord};
use crate::store::save_offers;
use crate::utils::{looks_truncated, strip_code_fence, truncate_for_log, utc_timestamp};
use awful_aj::{config::AwfulJadeConfig, config_dir, template, template::ChatTemplate};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Offers produced from a batch of leads.
#[derive(Debug, Default)]
pub struct GenerationOutcome {
    pub offers: Vec<OfferRecord>,
    /// Leads for which the LLM could not be reached.
    pub failed: usize,
}

/// LLM configuration and chat template loaded through `awful_aj`.
#[derive(Debug)]
pub struct LlmSetup {
    pub config: AwfulJadeConfig,
    pub template: ChatTemplate,
}

impl LlmSetup {
    /// Load the `awful_aj` config (from `settings.aj_config`, or its default
    /// config directory) and the configured chat template.
    #[instrument(level = "info", skip_all, fields(template = %settings.template))]
    pub async fn load(settings: &GeneratorSection) -> Result<Self, Box<dyn Error>> {
        let template = template::load_template(&settings.template).await?;
        info!("Loaded chat template");

        let conf_file = match &settings.aj_config {
            Some(path) => PathBuf::from(path),
            None => config_dir()?.join("config.yaml"),
        };
        let config_path = conf_file
            .to_str()
            .ok_or_else(|| format!("config path {:?} is not valid UTF-8", conf_file))?;
        let config = awful_aj::config::load_config(config_path)?;
        info!(config_path, "Loaded LLM configuration");

        Ok(Self { config, template })
    }

    /// A retrying, time-bounded client over this setup.
    pub fn client(&self, settings: &GeneratorSection) -> RetryAsk<AskFnWrapper<'_>> {
        let inner = AskFnWrapper {
            config: &self.config,
            template: &self.template,
            timeout: settings.timeout(),
        };
        RetryAsk::new(inner, settings.max_retries, settings.base_delay())
    }
}

/// The instruction sent for one pain point.
pub fn solution_prompt(pain_point: &str) -> String {
    format!(
        "Given the user pain point: \"{}\"\n\n\
         Create:\n\
         1. A short product idea (Notion template or AI prompt)\n\
         2. A one-line description\n\
         3. A monetization suggestion (freemium, bundle, upsell)\n\
         Return in JSON format with exactly the keys \"product\", \"description\" and \"monetization\".",
        pain_point
    )
}

/// Ask for a solution to every lead, in order.
///
/// A reply that is cut off mid-JSON is asked for once more. Leads whose
/// request fails after all retries are logged, counted and left out.
#[instrument(level = "info", skip_all, fields(leads = leads.len()))]
pub async fn generate_offers<A>(api: &RetryAsk<A>, leads: &[Lead]) -> GenerationOutcome
where
    A: AskAsync<Response = String> + fmt::Debug,
{
    let mut outcome = GenerationOutcome::default();

    for (i, lead) in leads.iter().enumerate() {
        debug!(index = i, pain_point = %truncate_for_log(&lead.pain_point, 80), "Generating solution");
        let prompt = solution_prompt(&lead.pain_point);

        let mut reply = match ask_with_backoff(api, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(index = i, error = %e, "LLM request failed; skipping lead");
                outcome.failed += 1;
                continue;
            }
        };

        let parsed = serde_json::from_str::<serde_json::Value>(strip_code_fence(&reply));
        if let Err(e) = parsed {
            if looks_truncated(&e) {
                warn!(index = i, error = %e, "EOF while parsing; re-asking once");
                match ask_with_backoff(api, &prompt).await {
                    Ok(r2) => reply = r2,
                    Err(e2) => warn!(index = i, error = %e2, "Re-ask failed; keeping first reply"),
                }
            } else {
                warn!(
                    index = i,
                    error = %e,
                    response_preview = %truncate_for_log(&reply, 300),
                    "Model returned non-JSON; it will be skipped when rendering"
                );
            }
        }

        outcome.offers.push(OfferRecord {
            pain_point: lead.pain_point.clone(),
            solution: strip_code_fence(&reply).to_string(),
            created_at: utc_timestamp(),
        });
    }

    info!(
        offers = outcome.offers.len(),
        failed = outcome.failed,
        "Generated offers"
    );
    outcome
}

/// Generate offers for `leads` and replace the offer store at `store` with
/// them.
///
/// When no lead produced an offer (the LLM was unreachable for all of them),
/// the existing store is left untouched so the published site survives.
#[instrument(level = "info", skip_all, fields(store = %store.display(), leads = leads.len()))]
pub async fn refresh_offer_store<A>(
    api: &RetryAsk<A>,
    leads: &[Lead],
    store: &Path,
) -> Result<GenerationOutcome, StoreError>
where
    A: AskAsync<Response = String> + fmt::Debug,
{
    let outcome = generate_offers(api, leads).await;
    if outcome.offers.is_empty() {
        warn!(
            failed = outcome.failed,
            "No offers generated; keeping the existing offer store"
        );
    } else {
        save_offers(store, &outcome.offers).await?;
        info!(offers = outcome.offers.len(), "Replaced offer store");
    }
    Ok(outcome)
}

/// Built-in offers used to seed the store without harvesting or an LLM.
pub fn fixture_offers() -> Vec<OfferRecord> {
    vec![
        OfferRecord {
            pain_point: "How do I get freelance clients without a portfolio?".to_string(),
            solution: "{\n  \"product\": \"Freelancer Cold DM Generator\",\n  \"description\": \"An AI tool that writes custom cold messages for landing freelance gigs.\",\n  \"monetization\": \"Free version for 5 messages/day, upgrade for unlimited\"\n}".to_string(),
            created_at: "2025-06-21T12:00:00Z".to_string(),
        },
        OfferRecord {
            pain_point: "Any AI tools to make social media content faster?".to_string(),
            solution: "{\n  \"product\": \"AI Content Calendar Builder\",\n  \"description\": \"Create a full month of content ideas with captions using a few keywords.\",\n  \"monetization\": \"One-time $5 download or included in bundle\"\n}".to_string(),
            created_at: "2025-06-21T12:10:00Z".to_string(),
        },
        OfferRecord {
            pain_point: "Is there a quick way to build landing pages for digital products?".to_string(),
            solution: "{\n  \"product\": \"No-Code Landing Page AI\",\n  \"description\": \"Just describe your product and it generates a full landing page in seconds.\",\n  \"monetization\": \"Upsell for access to templates, forms, and hosting\"\n}".to_string(),
            created_at: "2025-06-21T12:20:00Z".to_string(),
        },
    ]
}
