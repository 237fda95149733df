//! Detail page rendering.

use super::{INDEX_FILENAME, contact, head};
use crate::config::SiteSection;
use crate::models::{OfferRecord, RenderedPage, SolutionPayload};
use maud::{DOCTYPE, html};

/// Render the detail page for one offer.
///
/// The page embeds the product name as title and heading, the pain point as
/// the problem statement, the description and monetization note, the
/// call-to-action and the contact address. Every value is HTML-escaped, and
/// nothing time-dependent is included, so equal inputs give byte-identical
/// pages.
pub fn render_offer_page(
    site: &SiteSection,
    filename: &str,
    record: &OfferRecord,
    payload: &SolutionPayload,
) -> RenderedPage {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            (head(&payload.product))
            body {
                main {
                    h1 { (payload.product) }
                    section.problem {
                        h2 { "The problem" }
                        blockquote { (record.pain_point) }
                    }
                    section.solution {
                        h2 { "The solution" }
                        p.description { (payload.description) }
                        p.monetization {
                            strong { "Pricing:" }
                            " "
                            (payload.monetization)
                        }
                    }
                    p.cta {
                        a href=(site.payment_link) target="_blank" rel="noopener" { (site.buy_label) }
                    }
                    (contact(&site.contact_email))
                    p.back {
                        a href=(INDEX_FILENAME) { "All offers" }
                    }
                }
            }
        }
    };

    RenderedPage {
        relative_path: filename.to_string(),
        content: markup.into_string(),
    }
}
