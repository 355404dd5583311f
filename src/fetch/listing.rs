// src/fetch/listing.rs

use anyhow::{Context, Result};
use tracing::debug;
use url::Url;

use super::Fetch;
use crate::error::Error;
use crate::family::Family;

/// Fetch a family's listing page. Any status other than success is fatal
/// for the family's mirror run.
pub fn fetch_listing(fetcher: &dyn Fetch, family: Family) -> Result<String> {
    let url = Url::parse(family.listing_url())
        .with_context(|| format!("parsing listing URL {}", family.listing_url()))?;
    let resp = fetcher
        .get(&url)
        .with_context(|| format!("unable to fetch ICANN {} documents web page", family))?;
    if !resp.is_success() {
        return Err(Error::ListingStatus {
            family: family.name(),
            status: resp.status,
        }
        .into());
    }
    debug!(family = %family, bytes = resp.body.len(), "fetched listing");
    Ok(String::from_utf8_lossy(&resp.body).into_owned())
}
