//! The record → static site pipeline.
//!
//! A run moves through these stages:
//!
//! ```text
//! Idle → Loading → Rendering → IndexBuilding → Done
//!           │          │             │
//!           └──────────┴─────────────┴──→ Failed
//! ```
//!
//! A missing or empty offer store skips `Rendering`, but the index is still
//! built so the site always has a valid landing page. Malformed payloads and
//! failed page writes are logged, counted in the [`RunReport`] and skipped.
//! Only store failures (and write failures when `stop_on_error` is set) end
//! the run in `Failed`. Stale pages are only pruned once the new index is on
//! disk.

use crate::config::SiteConfig;
use crate::error::{PipelineError, StoreError};
use crate::models::ManifestEntry;
use crate::offers::parse_solution;
use crate::outputs::index::render_index;
use crate::outputs::pages::render_offer_page;
use crate::outputs::page_filename;
use crate::outputs::site::{ensure_output_dir, prune_stale_pages, write_page};
use crate::store::load_offers;
use crate::utils::truncate_for_log;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loading,
    Rendering,
    IndexBuilding,
    Done,
    Failed,
}

/// Summary of one pipeline run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    /// Records read from the store.
    pub loaded: usize,
    /// Detail pages rendered and written.
    pub rendered: usize,
    /// Records whose solution payload could not be parsed.
    pub skipped: usize,
    /// Detail page writes and stale page removals that failed.
    pub write_failures: usize,
    /// Stale detail pages removed from the output directory.
    pub pruned: usize,
    pub index_written: bool,
    /// Set when the index page could not be written.
    pub index_error: Option<String>,
    /// The store was missing or empty.
    pub nothing_to_render: bool,
    /// Detail pages linked from the index, in index order.
    pub manifest: Vec<ManifestEntry>,
}

/// Renders an offer store into a static site.
#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a SiteConfig,
    input: PathBuf,
    output_dir: PathBuf,
    stop_on_error: bool,
    stage: Stage,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a SiteConfig, input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            input: input.into(),
            output_dir: output_dir.into(),
            stop_on_error: false,
            stage: Stage::Idle,
        }
    }

    /// Abort the run on the first failed page write instead of skipping it.
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = ?self.stage, to = ?next, "Pipeline stage change");
        self.stage = next;
    }

    /// Run the pipeline once.
    #[instrument(level = "info", skip_all, fields(input = %self.input.display(), output_dir = %self.output_dir.display()))]
    pub async fn run(&mut self) -> Result<RunReport, PipelineError> {
        match self.execute().await {
            Ok(report) => {
                self.advance(Stage::Done);
                info!(
                    loaded = report.loaded,
                    rendered = report.rendered,
                    skipped = report.skipped,
                    write_failures = report.write_failures,
                    pruned = report.pruned,
                    index_written = report.index_written,
                    "Pipeline finished"
                );
                Ok(report)
            }
            Err(e) => {
                self.advance(Stage::Failed);
                error!(error = %e, "Pipeline failed");
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();

        self.advance(Stage::Loading);
        let records = match load_offers(&self.input).await {
            Ok(records) => records,
            Err(StoreError::Missing { path }) => {
                warn!(path = %path.display(), "No offer store found; nothing to render");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        report.loaded = records.len();

        // A failure here resurfaces, counted, on every write below.
        if let Err(e) = ensure_output_dir(&self.output_dir).await {
            error!(error = %e, "Could not create output directory");
        }

        let mut manifest = Vec::new();
        if records.is_empty() {
            info!("Offer store is empty; building an empty index");
            report.nothing_to_render = true;
        } else {
            self.advance(Stage::Rendering);
            let mut parsed = 0usize;
            for (i, record) in records.iter().enumerate() {
                let payload = match parse_solution(record) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(
                            index = i,
                            pain_point = %truncate_for_log(&record.pain_point, 80),
                            solution_preview = %truncate_for_log(&record.solution, 120),
                            error = %e,
                            "Skipping offer with malformed solution"
                        );
                        report.skipped += 1;
                        continue;
                    }
                };

                parsed += 1;
                let filename = page_filename(parsed);
                let page = render_offer_page(&self.config.site, &filename, record, &payload);
                match write_page(&self.output_dir, &page).await {
                    Ok(_) => {
                        report.rendered += 1;
                        manifest.push(ManifestEntry {
                            product: payload.product,
                            filename,
                        });
                    }
                    Err(e) => {
                        error!(index = i, page = %filename, error = %e, "Failed to write detail page");
                        report.write_failures += 1;
                        if self.stop_on_error {
                            return Err(PipelineError::WriteAborted(e));
                        }
                    }
                }
            }
        }

        self.advance(Stage::IndexBuilding);
        let index = render_index(&self.config.site, &manifest);
        match write_page(&self.output_dir, &index).await {
            Ok(path) => {
                info!(path = %path.display(), entries = manifest.len(), "Index page written");
                report.index_written = true;
            }
            Err(e) => {
                error!(error = %e, "Index page could not be written; the site has no landing page");
                if self.stop_on_error {
                    return Err(PipelineError::WriteAborted(e));
                }
                report.index_error = Some(e.to_string());
            }
        }

        // An index left over from an earlier run may still link the old pages.
        if report.index_error.is_some() {
            warn!("Keeping stale detail pages because the index was not updated");
        } else {
            let keep: Vec<String> = manifest.iter().map(|m| m.filename.clone()).collect();
            let pruned = prune_stale_pages(&self.output_dir, &keep).await;
            report.pruned = pruned.removed.len();
            for e in &pruned.failures {
                error!(error = %e, "Failed to prune stale page");
            }
            report.write_failures += pruned.failures.len();
        }

        report.manifest = manifest;
        Ok(report)
    }
}
