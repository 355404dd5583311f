//! Listing-page parsers, one per page layout.

use anyhow::{Context, Result};
use url::Url;

use crate::record::Listing;

mod embedded;
mod table;

pub use embedded::EmbeddedJsonExtractor;
pub use table::{TableExtractor, TableShape};

/// Site every relative link on a listing page is resolved against.
pub const SITE_ORIGIN: &str = "https://www.icann.org";

/// Turns a fetched listing page into document records.
pub trait Extractor {
    fn extract(&self, page: &str) -> Result<Listing>;
}

/// Resolve an href found on the site to an absolute URL.
pub fn resolve_href(href: &str) -> Result<Url> {
    let base = Url::parse(SITE_ORIGIN).context("parsing site origin")?;
    base.join(href.trim())
        .with_context(|| format!("resolving link {}", href))
}

/// Collapse runs of whitespace the way the page renders them.
pub(crate) fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
