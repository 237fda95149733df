//! Reddit pain-point harvester.
//!
//! Reads each configured subreddit's public `hot.json` listing and keeps the
//! posts whose title or body contains one of the configured keywords
//! ("how do i", "any tools", ...). Those posts become [`Lead`]s.
//!
//! # URL Pattern
//!
//! `{base_url}/{subreddit}/hot.json?limit={post_limit}`, e.g.
//! `https://www.reddit.com/r/freelance/hot.json?limit=20`.

use crate::config::HarvestSection;
use crate::error::{HarvestError, StoreError};
use crate::models::Lead;
use crate::utils::{take_chars, utc_timestamp};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

/// The fields of a Reddit post the harvester looks at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub permalink: String,
}

/// A subreddit that could not be harvested, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub subreddit: String,
    pub reason: String,
}

/// Result of harvesting every configured subreddit.
///
/// A failing subreddit never fails the harvest; it is listed in `failures`.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    pub leads: Vec<Lead>,
    pub failures: Vec<SourceFailure>,
}

#[derive(Debug)]
pub struct Harvester {
    client: Client,
    settings: HarvestSection,
}

impl Harvester {
    pub fn new(settings: &HarvestSection) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    fn listing_url(&self, subreddit: &str) -> Result<Url, HarvestError> {
        let mut base = Url::parse(&self.settings.base_url)?;
        // Without a trailing slash, `join` would replace the last path segment.
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        let mut url = base.join(&format!("{}/hot.json", subreddit.trim_matches('/')))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.settings.post_limit.to_string());
        Ok(url)
    }

    /// Fetch the hot posts of one subreddit (`"r/freelance"`).
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_posts(&self, subreddit: &str) -> Result<Vec<Post>, HarvestError> {
        let url = self.listing_url(subreddit)?;
        debug!(%url, "Requesting listing");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status(status));
        }

        let body = response.text().await?;
        let listing: Listing = serde_json::from_str(&body)?;
        let posts: Vec<Post> = listing.data.children.into_iter().map(|c| c.data).collect();
        info!(count = posts.len(), "Fetched posts");
        Ok(posts)
    }

    /// Harvest leads from every configured subreddit, one after another.
    #[instrument(level = "info", skip_all)]
    pub async fn harvest(&self) -> HarvestOutcome {
        let results: Vec<(String, Result<Vec<Post>, HarvestError>)> =
            stream::iter(self.settings.subreddits.clone())
                .then(|subreddit: String| async move {
                    let result = self.fetch_posts(&subreddit).await;
                    (subreddit, result)
                })
                .collect()
                .await;

        let mut outcome = HarvestOutcome::default();
        let mut leads = Vec::new();
        for (subreddit, result) in results {
            match result {
                Ok(posts) => {
                    let found = extract_pain_points(
                        &posts,
                        &self.settings.keywords,
                        self.settings.details_max_chars,
                    );
                    info!(%subreddit, posts = posts.len(), leads = found.len(), "Scanned subreddit");
                    leads.extend(found);
                }
                Err(e) => {
                    warn!(%subreddit, error = %e, "Subreddit harvest failed");
                    outcome.failures.push(SourceFailure {
                        subreddit,
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome.leads = leads.into_iter().unique_by(|l| l.url.clone()).collect();
        info!(
            leads = outcome.leads.len(),
            failed_sources = outcome.failures.len(),
            "Harvest complete"
        );
        outcome
    }
}

/// Keep the posts that mention any of `keywords` (case-insensitive) in their
/// title or body, and turn them into leads.
pub fn extract_pain_points(posts: &[Post], keywords: &[String], details_max_chars: usize) -> Vec<Lead> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    let timestamp = utc_timestamp();

    posts
        .iter()
        .filter_map(|post| {
            let text = format!("{} {}", post.title, post.selftext).to_lowercase();
            if !keywords.iter().any(|k| text.contains(k.as_str())) {
                return None;
            }
            Some(Lead {
                pain_point: post.title.clone(),
                details: take_chars(&post.selftext, details_max_chars),
                url: format!("https://reddit.com{}", post.permalink),
                timestamp: timestamp.clone(),
                tags: Vec::new(),
                urgency: text.matches(['?', '!']).count(),
            })
        })
        .collect()
}

/// Append `leads` to `path`, one JSON object per line.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = leads.len()))]
pub async fn save_leads(path: &Path, leads: &[Lead]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut lines = String::new();
    for lead in leads {
        let line = serde_json::to_string(lead).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        lines.push_str(&line);
        lines.push('\n');
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(io_err)?;
    file.write_all(lines.as_bytes()).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;
    info!("Appended leads");
    Ok(())
}

/// Read every lead from a JSON-lines file. Lines that do not parse are
/// logged and skipped.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_leads(path: &Path) -> Result<Vec<Lead>, StoreError> {
    let raw = fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let mut leads = Vec::new();
    for (n, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Lead>(line) {
            Ok(lead) => leads.push(lead),
            Err(e) => warn!(line = n + 1, error = %e, "Skipping unreadable lead"),
        }
    }
    info!(count = leads.len(), "Loaded leads");
    Ok(leads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post(title: &str, selftext: &str, permalink: &str) -> Post {
        Post {
            title: title.to_string(),
            selftext: selftext.to_string(),
            permalink: permalink.to_string(),
        }
    }

    fn listing(posts: &[Post]) -> serde_json::Value {
        let children: Vec<_> = posts
            .iter()
            .map(|p| {
                json!({"kind": "t3", "data": {
                    "title": p.title,
                    "selftext": p.selftext,
                    "permalink": p.permalink,
                    "score": 12
                }})
            })
            .collect();
        json!({"kind": "Listing", "data": {"children": children}})
    }

    fn settings(base_url: &str, subreddits: &[&str]) -> HarvestSection {
        HarvestSection {
            base_url: base_url.to_string(),
            subreddits: subreddits.iter().map(|s| s.to_string()).collect(),
            ..HarvestSection::default()
        }
    }

    #[test]
    fn test_listing_url_keeps_base_path() {
        for base in ["https://proxy.example/reddit", "https://proxy.example/reddit/"] {
            let harvester = Harvester::new(&settings(base, &[])).unwrap();
            let url = harvester.listing_url("r/freelance").unwrap();
            assert_eq!(
                url.as_str(),
                "https://proxy.example/reddit/r/freelance/hot.json?limit=20"
            );
        }

        let harvester = Harvester::new(&settings("https://www.reddit.com", &[])).unwrap();
        assert_eq!(
            harvester.listing_url("/r/SaaS/").unwrap().as_str(),
            "https://www.reddit.com/r/SaaS/hot.json?limit=20"
        );
    }

    #[test]
    fn test_extract_pain_points_matches_keywords() {
        let keywords = HarvestSection::default().keywords;
        let posts = vec![
            post("How do I find clients?!", "Nobody replies?", "/r/freelance/comments/1/a/"),
            post("Show off my new desk", "", "/r/freelance/comments/2/b/"),
            post("Tooling question", "Are there ANY TOOLS for invoices", "/r/freelance/comments/3/c/"),
        ];

        let leads = extract_pain_points(&posts, &keywords, 250);

        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].pain_point, "How do I find clients?!");
        assert_eq!(leads[0].url, "https://reddit.com/r/freelance/comments/1/a/");
        assert_eq!(leads[0].urgency, 3);
        assert_eq!(leads[1].pain_point, "Tooling question");
        assert_eq!(leads[1].urgency, 0);
    }

    #[test]
    fn test_extract_pain_points_truncates_details() {
        let keywords = vec!["please help".to_string()];
        let body = format!("please help {}", "x".repeat(400));
        let leads = extract_pain_points(&[post("Stuck", &body, "/r/x/1")], &keywords, 250);

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].details.chars().count(), 250);
    }

    #[tokio::test]
    async fn test_harvest_collects_leads_and_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/freelance/hot.json"))
            .and(query_param("limit", "20"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(&[
                post("Is there a way to automate proposals?", "", "/r/freelance/comments/1/"),
                post("My setup", "", "/r/freelance/comments/2/"),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/startups/hot.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let harvester =
            Harvester::new(&settings(&server.uri(), &["r/freelance", "r/startups"])).unwrap();
        let outcome = harvester.harvest().await;

        assert_eq!(outcome.leads.len(), 1);
        assert_eq!(outcome.leads[0].pain_point, "Is there a way to automate proposals?");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].subreddit, "r/startups");
        assert!(outcome.failures[0].reason.contains("503"));
    }

    #[tokio::test]
    async fn test_harvest_deduplicates_crossposts() {
        let server = MockServer::start().await;
        let crosspost = post("How do I price my app?", "", "/r/SaaS/comments/9/");
        for sub in ["/r/SaaS/hot.json", "/r/startups/hot.json"] {
            Mock::given(method("GET"))
                .and(path(sub))
                .respond_with(ResponseTemplate::new(200).set_body_json(listing(&[crosspost.clone()])))
                .mount(&server)
                .await;
        }

        let harvester = Harvester::new(&settings(&server.uri(), &["r/SaaS", "r/startups"])).unwrap();
        let outcome = harvester.harvest().await;

        assert_eq!(outcome.leads.len(), 1);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_posts_rejects_unexpected_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/freelance/hot.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
            .mount(&server)
            .await;

        let harvester = Harvester::new(&settings(&server.uri(), &["r/freelance"])).unwrap();
        let err = harvester.fetch_posts("r/freelance").await.unwrap_err();
        assert!(matches!(err, HarvestError::Body(_)));
    }

    #[tokio::test]
    async fn test_fetch_posts_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(listing(&[]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut settings = settings(&server.uri(), &["r/freelance"]);
        settings.timeout_secs = 1;
        let harvester = Harvester::new(&settings).unwrap();

        let err = harvester.fetch_posts("r/freelance").await.unwrap_err();
        assert!(matches!(err, HarvestError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_save_and_load_leads_appends() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("leads_raw.json");
        let keywords = vec!["how do i".to_string()];
        let first = extract_pain_points(&[post("How do I A?", "", "/a")], &keywords, 250);
        let second = extract_pain_points(&[post("How do I B?", "", "/b")], &keywords, 250);

        save_leads(&file, &first).await.unwrap();
        save_leads(&file, &second).await.unwrap();
        std::fs::write(
            &file,
            format!("{}not json\n", std::fs::read_to_string(&file).unwrap()),
        )
        .unwrap();

        let leads = load_leads(&file).await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].pain_point, "How do I A?");
        assert_eq!(leads[1].pain_point, "How do I B?");
    }

    #[tokio::test]
    async fn test_load_leads_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = load_leads(&tmp.path().join("none.json")).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
    }
}
