//! Static site generation.
//!
//! # Submodules
//!
//! - [`pages`]: renders one detail page per offer
//! - [`index`]: renders the listing page linking every detail page
//! - [`site`]: writes rendered pages into the output directory
//!
//! Rendering is pure: the render functions take data and return a
//! [`RenderedPage`](crate::models::RenderedPage), and only [`site`] touches
//! the filesystem.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── index.html
//! ├── product_1.html
//! ├── product_2.html
//! └── ...
//! ```

pub mod index;
pub mod pages;
pub mod site;

use maud::{Markup, PreEscaped, html};

/// File name of the listing page.
pub const INDEX_FILENAME: &str = "index.html";

const PAGE_PREFIX: &str = "product_";
const PAGE_SUFFIX: &str = ".html";

const STYLESHEET: &str = "body{font-family:system-ui,-apple-system,sans-serif;margin:0;background:#f6f6f4;color:#1d1d1f}\
main{max-width:42rem;margin:0 auto;padding:2.5rem 1.25rem}\
h1{font-size:2rem;margin:0 0 1rem}\
h2{font-size:1.1rem;margin:1.75rem 0 .5rem;text-transform:uppercase;letter-spacing:.04em;color:#555}\
blockquote{margin:0;padding:.75rem 1rem;border-left:4px solid #d0d0cc;background:#fff}\
ul.offers{padding-left:1.25rem;line-height:1.9}\
p.empty{padding:1rem;background:#fff;border:1px dashed #c5c5c0}\
p.cta a{display:inline-block;margin-top:1.5rem;padding:.7rem 1.2rem;background:#1d1d1f;color:#fff;text-decoration:none;border-radius:6px}\
p.contact,p.back{margin-top:1.5rem;font-size:.95rem}";

/// File name of the `n`-th detail page (1-based).
pub fn page_filename(n: usize) -> String {
    format!("{}{}{}", PAGE_PREFIX, n, PAGE_SUFFIX)
}

/// Inverse of [`page_filename`]: the page number if `name` is a detail page.
pub fn page_number(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(PAGE_PREFIX)?.strip_suffix(PAGE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn head(title: &str) -> Markup {
    html! {
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            title { (title) }
            style { (PreEscaped(STYLESHEET)) }
        }
    }
}

fn contact(email: &str) -> Markup {
    html! {
        p.contact {
            strong { "Contact:" }
            " "
            a href={ "mailto:" (email) } { (email) }
        }
    }
}
