// src/extract/table.rs

use anyhow::{bail, Result};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

use super::{resolve_href, squash_whitespace, Extractor};
use crate::record::{DocumentRecord, Listing};

/// Known defects in the SSAC table markup, patched before parsing.
const SSAC_FIXUPS: &[(&str, &str)] = &[
    ("<td>[SAC030]", "<tr><td>[SAC030]"),
    ("</a>- Executive Summary", "- Executive Summary</a>"),
];

/// The two table layouts in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableShape {
    /// `[SAC036]` in the first cell, title in the second, document links
    /// anywhere in the row. No header row.
    Bracketed,
    /// Header row, then: linked id, title, date.
    Headed,
}

pub struct TableExtractor {
    shape: TableShape,
}

impl TableExtractor {
    pub fn new(shape: TableShape) -> Self {
        Self { shape }
    }
}

impl Extractor for TableExtractor {
    fn extract(&self, page: &str) -> Result<Listing> {
        let fixed;
        let page = match self.shape {
            TableShape::Bracketed => {
                fixed = SSAC_FIXUPS
                    .iter()
                    .fold(page.to_string(), |acc, (from, to)| acc.replace(from, to));
                fixed.as_str()
            }
            TableShape::Headed => page,
        };

        let doc = Html::parse_document(page);
        let table_sel = Selector::parse("table").expect("table selector should parse");
        let row_sel = Selector::parse("tr").expect("row selector should parse");
        let cell_sel = Selector::parse("td").expect("cell selector should parse");

        let Some(table) = doc.select(&table_sel).next() else {
            bail!("no document table on the listing page");
        };

        let skip = match self.shape {
            TableShape::Bracketed => 0,
            TableShape::Headed => 1,
        };

        let mut listing = Listing::new();
        for row in table.select(&row_sel).skip(skip) {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            let record = match self.shape {
                TableShape::Bracketed => bracketed_row(row, &cells),
                TableShape::Headed => headed_row(&cells),
            };
            if let Some(record) = record {
                listing.insert(record.document_id.clone(), record);
            }
        }
        Ok(listing)
    }
}

fn bracketed_row(row: ElementRef, cells: &[ElementRef]) -> Option<DocumentRecord> {
    let first = cells.first()?;
    let marker = first.text().collect::<String>();
    if !marker.contains("SAC") {
        return None;
    }
    let id = marker.split_once('[')?.1.split_once(']')?.0.trim().to_string();
    let title = cells.get(1).map(|c| first_line(*c)).unwrap_or_default();

    let Some(href) = primary_link(row, &id) else {
        debug!(id = %id, "no document link in row");
        return None;
    };
    let source_url = match resolve_href(&href) {
        Ok(u) => u,
        Err(e) => {
            warn!(id = %id, error = %e, "skipping row");
            return None;
        }
    };

    Some(DocumentRecord {
        document_id: id,
        title,
        source_url,
        published_date: None,
    })
}

/// Pick the row's document link: the English PDF, or the English HTML page
/// when the row only offers HTML. Two old documents break the pattern.
fn primary_link(row: ElementRef, id: &str) -> Option<String> {
    let link_sel = Selector::parse("a[href]").expect("link selector should parse");
    let links: Vec<(String, String)> = row
        .select(&link_sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim().to_string();
            Some((href, a.text().collect::<String>()))
        })
        .collect();
    let only_html = links.iter().all(|(href, _)| href.ends_with(".htm"));

    links
        .into_iter()
        .filter(|(_, text)| !text.contains("Executive Summary"))
        .map(|(href, _)| href)
        .find(|href| {
            href.ends_with("-en.pdf")
                || (only_html && href.ends_with("-en.htm"))
                || (id == "SAC013" && href.ends_with(".htm"))
                || (id == "SAC007" && href.ends_with(".pdf"))
        })
}

fn headed_row(cells: &[ElementRef]) -> Option<DocumentRecord> {
    let link_sel = Selector::parse("a[href]").expect("link selector should parse");
    let anchor = cells
        .first()?
        .select(&link_sel)
        .find(|a| !a.text().collect::<String>().trim().is_empty())?;
    let id = squash_whitespace(&anchor.text().collect::<String>());
    let href = anchor.value().attr("href")?;
    let source_url = match resolve_href(href) {
        Ok(u) => u,
        Err(e) => {
            warn!(id = %id, error = %e, "skipping row");
            return None;
        }
    };
    let title = cells.get(1).map(|c| first_line(*c)).unwrap_or_default();
    let published_date = cells
        .get(2)
        .map(|c| squash_whitespace(&c.text().collect::<String>()))
        .filter(|d| !d.is_empty());

    Some(DocumentRecord {
        document_id: id,
        title,
        source_url,
        published_date,
    })
}

/// Text of a cell up to its first `<br>`.
fn first_line(cell: ElementRef) -> String {
    let mut text = String::new();
    for child in cell.children() {
        match child.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "br" => break,
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    text.extend(el.text());
                }
            }
            _ => {}
        }
    }
    squash_whitespace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SSAC_PAGE: &str = r#"<html><body>
<table>
<tr><td>[SAC031]</td><td>SSAC Comment on Orphan Glue<br/>Published 2008</td>
<td><a href="/en/files/file/sac-031-en.pdf">PDF</a> <a href="/en/files/file/sac-031-en.htm">HTML</a></td></tr>
<td>[SAC030]</td><td>Passing the Buck</td>
<td><a href="/en/files/file/sac-030-en.pdf">PDF</a></td></tr>
<tr><td>[SAC029]</td><td>Comment on <em>Fast Flux</em><br/>extra</td>
<td><a href="/en/files/file/sac-029-summary-en.pdf">Summary</a>- Executive Summary
<a href="/en/files/file/sac-029-en.pdf">Full</a></td></tr>
<tr><td>[SAC013]</td><td>Renewal Considerations</td>
<td><a href="/en/files/file/sac013.htm">HTML</a><a href="/en/files/file/sac013.pdf">PDF</a></td></tr>
<tr><td>[SAC010]</td><td>Only HTML</td>
<td><a href="/groups/ssac/sac-010-en.htm">HTML</a></td></tr>
<tr><td>Header</td><td>nothing</td></tr>
</table></body></html>"#;

    const RSSAC_PAGE: &str = r#"<html><body>
<table>
<tr><th>Document</th><th>Title</th><th>Date</th></tr>
<tr><td><a href="/en/files/file/rssac-028-en.pdf">RSSAC028</a></td>
<td>Technical Analysis of the Naming Scheme</td><td>02 Aug 2017</td></tr>
<tr><td><a href="/uploads/rssac-002-measurements-v3.pdf">RSSAC002v3</a></td>
<td>RSSAC Advisory on Measurements<br/>of the Root Server System</td><td>01 Jun 2016</td></tr>
<tr><td>no link</td><td>ignored</td><td></td></tr>
</table></body></html>"#;

    #[test]
    fn ssac_rows_with_fixups() {
        let listing = TableExtractor::new(TableShape::Bracketed)
            .extract(SSAC_PAGE)
            .unwrap();
        let ids: Vec<&str> = listing.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["SAC010", "SAC013", "SAC029", "SAC030", "SAC031"]);

        let sac031 = &listing["SAC031"];
        assert_eq!(sac031.title, "SSAC Comment on Orphan Glue");
        assert_eq!(
            sac031.source_url.as_str(),
            "https://www.icann.org/en/files/file/sac-031-en.pdf"
        );

        // row without an opening <tr>
        assert_eq!(listing["SAC030"].title, "Passing the Buck");
        assert!(listing["SAC030"]
            .source_url
            .as_str()
            .ends_with("sac-030-en.pdf"));

        // misplaced summary anchor is repaired and ignored
        assert_eq!(listing["SAC029"].title, "Comment on Fast Flux");
        assert!(listing["SAC029"]
            .source_url
            .as_str()
            .ends_with("sac-029-en.pdf"));

        assert!(listing["SAC013"].source_url.as_str().ends_with("sac013.htm"));
        assert!(listing["SAC010"]
            .source_url
            .as_str()
            .ends_with("sac-010-en.htm"));
    }

    #[test]
    fn rssac_rows_skip_header() {
        let listing = TableExtractor::new(TableShape::Headed)
            .extract(RSSAC_PAGE)
            .unwrap();
        assert_eq!(listing.len(), 2);

        let doc = &listing["RSSAC002v3"];
        assert_eq!(doc.title, "RSSAC Advisory on Measurements");
        assert_eq!(doc.published_date.as_deref(), Some("01 Jun 2016"));
        assert_eq!(
            doc.source_url.as_str(),
            "https://www.icann.org/uploads/rssac-002-measurements-v3.pdf"
        );
        assert_eq!(listing["RSSAC028"].published_date.as_deref(), Some("02 Aug 2017"));
    }

    #[test]
    fn later_rows_overwrite_earlier_ones() {
        let page = r#"<table><tr><th>h</th></tr>
<tr><td><a href="/a-en.pdf">RSSAC001</a></td><td>First</td><td>d1</td></tr>
<tr><td><a href="/b-en.pdf">RSSAC001</a></td><td>Second</td><td>d2</td></tr>
</table>"#;
        let listing = TableExtractor::new(TableShape::Headed).extract(page).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing["RSSAC001"].title, "Second");
    }

    #[test]
    fn missing_table_is_an_error() {
        let err = TableExtractor::new(TableShape::Headed)
            .extract("<html><body><p>maintenance</p></body></html>")
            .unwrap_err();
        assert!(err.to_string().contains("no document table"));
    }
}
