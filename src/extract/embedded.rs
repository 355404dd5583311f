// src/extract/embedded.rs

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{resolve_href, squash_whitespace, Extractor};
use crate::record::{DocumentRecord, Listing};

/// Transfer-state escapes used in the page's embedded JSON. `&a;` must be
/// undone last so it cannot create new escapes.
const STATE_ESCAPES: &[(&str, &str)] = &[
    ("&q;", "\""),
    ("&s;", "'"),
    ("&l;", "<"),
    ("&g;", ">"),
    ("&a;", "&"),
];

/// Reads the application state the site appends to its pages as a
/// `<script>` element on the final line, and walks `key_path` to the list
/// of content summaries.
pub struct EmbeddedJsonExtractor {
    key_path: &'static [&'static str],
}

impl EmbeddedJsonExtractor {
    pub fn new(key_path: &'static [&'static str]) -> Self {
        Self { key_path }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentSummary {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    extra: Option<Extra>,
    #[serde(default)]
    reference: Option<ReferenceLink>,
    #[serde(default)]
    page: Option<PageLink>,
    #[serde(default)]
    external_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Extra {
    document_id: String,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReferenceLink {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    path: Option<String>,
}

impl ContentSummary {
    fn is_english(&self) -> bool {
        self.language
            .as_deref()
            .map(|l| l.eq_ignore_ascii_case("en") || l.eq_ignore_ascii_case("english"))
            .unwrap_or(false)
    }

    /// Each item type keeps its link in a different place.
    fn href(&self) -> Result<Option<&str>> {
        Ok(match self.kind.as_str() {
            "reference" => self.reference.as_ref().and_then(|r| r.url.as_deref()),
            "page" => self.page.as_ref().and_then(|p| p.path.as_deref()),
            "external" => self.external_url.as_deref(),
            other => return Err(anyhow!("unrecognised content summary type `{}`", other)),
        })
    }
}

impl Extractor for EmbeddedJsonExtractor {
    fn extract(&self, page: &str) -> Result<Listing> {
        let raw = state_script(page)?.context("no embedded state script on the listing page")?;
        let json = STATE_ESCAPES
            .iter()
            .fold(raw.to_string(), |acc, (from, to)| acc.replace(from, to));
        let state: Value = serde_json::from_str(&json).context("parsing embedded state")?;
        if !state.is_object() {
            anyhow::bail!("embedded state is not a JSON object");
        }

        let mut node = &state;
        for key in self.key_path {
            node = node
                .get(key)
                .with_context(|| format!("embedded state has no `{}`", key))?;
        }
        let items = node
            .as_array()
            .with_context(|| format!("`{}` is not a list", self.key_path.join(".")))?;

        let mut listing = Listing::new();
        for (i, item) in items.iter().enumerate() {
            let summary: ContentSummary = match serde_json::from_value(item.clone()) {
                Ok(s) => s,
                Err(e) => {
                    warn!(item = i, error = %e, "skipping malformed content summary");
                    continue;
                }
            };
            let Some(extra) = summary.extra.as_ref() else {
                debug!(item = i, "no extra data; not a publication");
                continue;
            };
            if !summary.is_english() {
                debug!(item = i, id = %extra.document_id, "not English");
                continue;
            }
            let href = match summary.href() {
                Ok(Some(href)) => href,
                Ok(None) => {
                    warn!(item = i, id = %extra.document_id, kind = %summary.kind, "no link for item");
                    continue;
                }
                Err(e) => {
                    warn!(item = i, id = %extra.document_id, error = %e, "skipping item");
                    continue;
                }
            };
            let source_url = match resolve_href(href) {
                Ok(u) => u,
                Err(e) => {
                    warn!(item = i, id = %extra.document_id, error = %e, "skipping item");
                    continue;
                }
            };

            let document_id = extra.document_id.trim().to_string();
            listing.insert(
                document_id.clone(),
                DocumentRecord {
                    document_id,
                    title: squash_whitespace(summary.title.as_deref().unwrap_or_default()),
                    source_url,
                    published_date: extra.date.clone().filter(|d| !d.trim().is_empty()),
                },
            );
        }
        Ok(listing)
    }
}

/// Body of the last `<script>` element on the last line that has one.
fn state_script(page: &str) -> Result<Option<&str>> {
    let re = Regex::new(r"(?s)<script[^>]*>(.*?)</script>")?;
    let Some(line) = page.lines().rev().find(|l| l.contains("<script")) else {
        return Ok(None);
    };
    let last = line.rfind("<script").map_or(line, |at| &line[at..]);
    Ok(re
        .captures(last)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_PATH: &[&str] = &["octo-publications", "page", "contentSummaries"];

    fn page_with(items: &str) -> String {
        let state = format!(
            r#"{{"octo-publications":{{"page":{{"contentSummaries":[{}]}}}}}}"#,
            items.replace('\n', " ")
        )
        .replace('"', "&q;");
        format!(
            "<html><body><app-root></app-root>\n<script>var x = 1;</script>\n\
             <script id=\"serverApp-state\" type=\"application/json\">{}</script></body></html>\n",
            state
        )
    }

    #[test]
    fn extracts_each_item_type() {
        let page = page_with(
            r#"
            {"type":"reference","title":"DNS Abuse  Report","language":"en",
             "extra":{"documentId":"OCTO-017","date":"19 Nov 2020"},
             "reference":{"url":"/en/files/file/octo-017-en.pdf"}},
            {"type":"page","title":"Root Zone KSK","language":"English",
             "extra":{"documentId":"OCTO-005"},
             "page":{"path":"/resources/pages/octo-005-2019-06-01-en"}},
            {"type":"external","title":"Hosted Elsewhere","language":"EN",
             "extra":{"documentId":"OCTO-009"},
             "externalUrl":"https://example.org/octo-9.pdf"}
            "#,
        );
        let listing = EmbeddedJsonExtractor::new(KEY_PATH).extract(&page).unwrap();
        assert_eq!(listing.len(), 3);

        let doc = &listing["OCTO-017"];
        assert_eq!(doc.title, "DNS Abuse Report");
        assert_eq!(doc.published_date.as_deref(), Some("19 Nov 2020"));
        assert_eq!(
            doc.source_url.as_str(),
            "https://www.icann.org/en/files/file/octo-017-en.pdf"
        );
        assert_eq!(
            listing["OCTO-005"].source_url.as_str(),
            "https://www.icann.org/resources/pages/octo-005-2019-06-01-en"
        );
        assert_eq!(
            listing["OCTO-009"].source_url.as_str(),
            "https://example.org/octo-9.pdf"
        );
    }

    #[test]
    fn filters_and_skips_bad_items() {
        let page = page_with(
            r#"
            {"type":"reference","title":"No extra","language":"en",
             "reference":{"url":"/a-en.pdf"}},
            {"type":"reference","title":"Spanish","language":"es",
             "extra":{"documentId":"OCTO-001"},"reference":{"url":"/a-es.pdf"}},
            {"type":"video","title":"Unknown type","language":"en",
             "extra":{"documentId":"OCTO-002"}},
            {"type":"page","title":"Page without path","language":"en",
             "extra":{"documentId":"OCTO-003"},"page":{}},
            {"title":"No type at all"},
            {"type":"reference","title":"Kept &a; sound","language":"en",
             "extra":{"documentId":"OCTO-004"},"reference":{"url":"/b-en.pdf"}}
            "#,
        );
        let listing = EmbeddedJsonExtractor::new(KEY_PATH).extract(&page).unwrap();
        let ids: Vec<&str> = listing.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["OCTO-004"]);
        assert_eq!(listing["OCTO-004"].title, "Kept & sound");
    }

    #[test]
    fn state_script_is_the_last_on_its_line() {
        let state = r#"{"octo-publications":{"page":{"contentSummaries":[
            {"type":"reference","title":"Shared line","language":"en",
             "extra":{"documentId":"OCTO-020"},"reference":{"url":"/c-en.pdf"}}]}}}"#
            .replace('\n', " ")
            .replace('"', "&q;");
        let page = format!(
            "<html><body><app-root></app-root>\n\
             <script src=\"main.js\"></script><script id=\"serverApp-state\" \
             type=\"application/json\">{}</script></body></html>\n",
            state
        );

        let listing = EmbeddedJsonExtractor::new(KEY_PATH).extract(&page).unwrap();

        assert_eq!(listing["OCTO-020"].title, "Shared line");
    }

    #[test]
    fn untyped_item_without_extra_is_not_malformed() {
        let summary: ContentSummary =
            serde_json::from_value(serde_json::json!({"title": "Navigation"})).unwrap();
        assert!(summary.extra.is_none());
        assert_eq!(summary.kind, "");
    }

    #[test]
    fn missing_key_path_is_an_error() {
        let page = "<html>\n<script type=\"application/json\">{&q;other&q;:{}}</script>\n";
        let err = EmbeddedJsonExtractor::new(KEY_PATH)
            .extract(page)
            .unwrap_err();
        assert!(err.to_string().contains("octo-publications"));
    }

    #[test]
    fn page_without_state_is_an_error() {
        assert!(EmbeddedJsonExtractor::new(KEY_PATH)
            .extract("<html><body>nothing</body></html>")
            .is_err());
    }
}
