//! Strip the site's navigation and branding from downloaded HTML pages.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::fs::{self, File, FileTimes};
use std::path::Path;
use tracing::warn;

use crate::extract::SITE_ORIGIN;

const TITLE_SUFFIX: &str = " - ICANN";
const EMBEDDED_CLASS: &str = " class=\"EmbeddedHTML\"";

/// Rewrite the HTML file at `path` in place, keeping its timestamps.
pub fn sanitize_file(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    #[cfg(target_os = "macos")]
    let times = {
        use std::os::macos::fs::FileTimesExt;
        match meta.created() {
            Ok(created) => times.set_created(created),
            Err(_) => times,
        }
    };
    #[cfg(windows)]
    let times = {
        use std::os::windows::fs::FileTimesExt;
        match meta.created() {
            Ok(created) => times.set_created(created),
            Err(_) => times,
        }
    };

    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let cleaned = clean_html(&String::from_utf8_lossy(&raw))?;
    fs::write(path, cleaned).with_context(|| format!("writing {}", path.display()))?;

    File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_times(times))
        .with_context(|| format!("restoring timestamps of {}", path.display()))?;
    Ok(())
}

/// Build the trimmed-down page: title, optional date, and the embedded
/// document markup with site-relative links made absolute.
pub fn clean_html(html: &str) -> Result<String> {
    let page = Html::parse_document(html);
    let title_sel = Selector::parse("title").expect("title selector should parse");
    let date_sel = Selector::parse("iti-date-tag").expect("date selector should parse");
    let body_sel = Selector::parse("div.EmbeddedHTML").expect("embedded selector should parse");

    let title = page
        .select(&title_sel)
        .next()
        .map(|t| t.text().collect::<String>())
        .unwrap_or_default();
    let title = title.trim();
    let title = escape(title.strip_suffix(TITLE_SUFFIX).unwrap_or(title));

    let date = page
        .select(&date_sel)
        .next()
        .map(|d| d.text().collect::<String>().trim().to_string());

    let embedded = match page.select(&body_sel).next() {
        Some(el) => absolutize_links(&el.html())?.replace(EMBEDDED_CLASS, ""),
        None => {
            warn!(title = %title, "page has no embedded document");
            String::new()
        }
    };

    let mut out = String::with_capacity(embedded.len() + 256);
    out.push_str("<!DOCTYPE html>\n");
    out.push_str("<html lang=\"en\">\n");
    out.push_str("<head>\n");
    out.push_str("<meta charset=\"utf-8\"/>\n");
    out.push_str(&format!("<title>{}</title>\n", title));
    out.push_str("</head>\n");
    out.push_str("<body>\n");
    out.push_str(&format!("<div><h1>{}</h1></div>\n", title));
    if let Some(date) = date {
        out.push_str(&format!("<div><p>{}</p></div>\n", escape(&date)));
    }
    out.push_str(&embedded);
    out.push('\n');
    out.push_str("</body>\n");
    out.push_str("</html>\n");
    Ok(out)
}

/// `//host/x` gets the https scheme and `/x` the site origin.
fn absolutize_links(markup: &str) -> Result<String> {
    let re = Regex::new(r#"href="([^"]*)""#)?;
    Ok(re
        .replace_all(markup, |caps: &Captures| {
            let href = &caps[1];
            if href.starts_with("//") {
                format!("href=\"https:{}\"", href)
            } else if href.starts_with('/') {
                format!("href=\"{}{}\"", SITE_ORIGIN, href)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
