//! Index page rendering.

use super::{INDEX_FILENAME, contact, head};
use crate::config::SiteSection;
use crate::models::{ManifestEntry, RenderedPage};
use maud::{DOCTYPE, html};

/// Render the listing page for every entry of the manifest, in order.
///
/// Each entry becomes a link to its detail page labelled with the product
/// name. An empty manifest still produces a complete page, showing
/// [`SiteSection::empty_message`] in place of the list.
pub fn render_index(site: &SiteSection, manifest: &[ManifestEntry]) -> RenderedPage {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            (head(&site.title))
            body {
                main {
                    h1 { (site.headline) }
                    p.tagline { (site.tagline) }
                    @if manifest.is_empty() {
                        p.empty { (site.empty_message) }
                    } @else {
                        ul.offers {
                            @for entry in manifest {
                                li { a href=(entry.filename) { (entry.product) } }
                            }
                        }
                    }
                    p.cta {
                        a href=(site.payment_link) target="_blank" rel="noopener" { (site.bundle_label) }
                    }
                    (contact(&site.contact_email))
                }
            }
        }
    };

    RenderedPage {
        relative_path: INDEX_FILENAME.to_string(),
        content: markup.into_string(),
    }
}
