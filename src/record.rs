use std::collections::BTreeMap;

use url::Url;

/// One published document as discovered on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Family-scoped identifier, e.g. `SAC036`, `RSSAC028`, `OCTO-017`.
    pub document_id: String,
    /// Display title; never used to build filenames.
    pub title: String,
    pub source_url: Url,
    pub published_date: Option<String>,
}

/// Records keyed by document id. A later record for the same id replaces
/// the earlier one; iteration runs in ascending id order.
pub type Listing = BTreeMap<String, DocumentRecord>;
