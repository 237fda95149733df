//! Data models shared by the harvester, the generator and the site pipeline.
//!
//! - [`Lead`]: a forum post that looks like somebody asking for help
//! - [`OfferRecord`]: one pain point paired with a generated solution
//! - [`SolutionPayload`]: the structured solution embedded in an offer
//! - [`RenderedPage`]: markup ready to be written into the output directory
//! - [`ManifestEntry`]: a detail page that made it to disk, used by the index

use serde::{Deserialize, Serialize};

/// A harvested post that matched one of the pain-point keywords.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Lead {
    /// The post title, used verbatim as the pain point.
    pub pain_point: String,
    /// The beginning of the post body.
    pub details: String,
    /// Permalink to the post.
    pub url: String,
    /// When the lead was harvested (UTC, RFC 3339).
    pub timestamp: String,
    pub tags: Vec<String>,
    /// Number of `?` and `!` in the post, a rough measure of desperation.
    pub urgency: usize,
}

/// One offer as stored in the offer store (`ai_products.json`).
///
/// The `solution` field is itself a JSON document, encoded as a string. It is
/// parsed lazily by [`crate::offers::parse_solution`] so that one bad record
/// never prevents the rest of the store from loading.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OfferRecord {
    pub pain_point: String,
    pub solution: String,
    pub created_at: String,
}

/// The product proposal embedded in [`OfferRecord::solution`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SolutionPayload {
    pub product: String,
    pub description: String,
    pub monetization: String,
}

/// A page of markup and where it goes, relative to the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub relative_path: String,
    pub content: String,
}

/// A detail page that was rendered and written successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    /// Product name, used as the link label on the index.
    pub product: String,
    /// File name of the detail page, relative to the output directory.
    pub filename: String,
}
