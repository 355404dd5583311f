//! Download records into a family directory, once.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::alias::ensure_alias;
use crate::family::Family;
use crate::fetch::{download_document, Fetch};
use crate::record::DocumentRecord;
use crate::sanitize::sanitize_file;

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// An entry with the derived filename was already on disk.
    AlreadyPresent(PathBuf),
    Fetched {
        path: PathBuf,
        alias: Option<String>,
    },
    /// Reported and left for the next run.
    Failed,
}

pub struct Store<'a> {
    dir: &'a Path,
    family: Family,
}

impl<'a> Store<'a> {
    pub fn new(dir: &'a Path, family: Family) -> Self {
        Self { dir, family }
    }

    /// Fetch `record` unless its file exists. Failures are logged, never
    /// returned, so one bad document cannot stop the batch.
    pub fn store(&self, fetcher: &dyn Fetch, record: &DocumentRecord) -> StoreOutcome {
        let Some(filename) = self.family.local_filename(&record.source_url) else {
            error!(url = %record.source_url, id = %record.document_id, "no filename in URL");
            return StoreOutcome::Failed;
        };
        let path = self.dir.join(&filename);

        if path.symlink_metadata().is_ok() {
            debug!(file = %filename, "already mirrored");
            return StoreOutcome::AlreadyPresent(path);
        }

        if let Err(e) = download_document(fetcher, &record.source_url, &path) {
            error!("Unable to fetch {}: {:#}", record.source_url, e);
            return StoreOutcome::Failed;
        }
        info!("{}", record.source_url);

        if is_html(&filename) {
            if let Err(e) = sanitize_file(&path) {
                warn!(file = %filename, "cleaning HTML failed: {:#}", e);
            }
        }

        let alias = match ensure_alias(self.dir, self.family, &record.document_id, &filename) {
            Ok(alias) => alias,
            Err(e) => {
                warn!(file = %filename, "{:#}", e);
                None
            }
        };
        if let Some(alias) = &alias {
            info!("  With symlink {}", alias);
        }

        StoreOutcome::Fetched { path, alias }
    }
}

fn is_html(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    lower.ends_with(".htm") || lower.ends_with(".html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fake::FakeFetcher;
    use std::fs;
    use tempfile::tempdir;
    use url::Url;

    fn record(id: &str, url: &str) -> DocumentRecord {
        DocumentRecord {
            document_id: id.to_string(),
            title: "t".to_string(),
            source_url: Url::parse(url).unwrap(),
            published_date: None,
        }
    }

    #[test]
    fn existing_file_is_not_requested() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("sac-001-en.pdf"), b"old").unwrap();
        let url = "https://www.icann.org/en/files/file/sac-001-en.pdf";
        let fetcher = FakeFetcher::default().with(url, 200, "new");

        let outcome = Store::new(tmp.path(), Family::Ssac).store(&fetcher, &record("SAC001", url));

        assert!(matches!(outcome, StoreOutcome::AlreadyPresent(_)));
        assert!(fetcher.requests.borrow().is_empty());
        assert_eq!(fs::read(tmp.path().join("sac-001-en.pdf")).unwrap(), b"old");
    }

    #[test]
    fn fetches_and_aliases() {
        let tmp = tempdir().unwrap();
        let url = "https://www.icann.org/en/files/file/sac030.pdf";
        let fetcher = FakeFetcher::default().with(url, 200, "pdf");

        let outcome = Store::new(tmp.path(), Family::Ssac).store(&fetcher, &record("SAC030", url));

        assert_eq!(
            outcome,
            StoreOutcome::Fetched {
                path: tmp.path().join("sac030.pdf"),
                alias: Some("sac-030-en.pdf".to_string()),
            }
        );
        assert_eq!(fs::read(tmp.path().join("sac-030-en.pdf")).unwrap(), b"pdf");
    }

    #[test]
    fn html_pages_are_cleaned() {
        let tmp = tempdir().unwrap();
        let url = "https://www.icann.org/resources/pages/octo-004-2019-06-01-en";
        let page = "<html><head><title>OCTO-004 - ICANN</title></head><body>\
                    <nav>menu</nav><div class=\"EmbeddedHTML\">body</div></body></html>";
        let fetcher = FakeFetcher::default().with(url, 200, page);

        let outcome = Store::new(tmp.path(), Family::Octo).store(&fetcher, &record("OCTO-004", url));

        let StoreOutcome::Fetched { path, alias } = outcome else {
            panic!("expected a fetch");
        };
        assert_eq!(path, tmp.path().join("octo-004-2019-06-01-en.htm"));
        assert_eq!(alias, None);
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("<title>OCTO-004</title>"));
        assert!(!text.contains("menu"));
    }

    #[test]
    fn failure_is_reported_not_raised() {
        let tmp = tempdir().unwrap();
        let url = "https://www.icann.org/en/files/file/sac-002-en.pdf";
        let fetcher = FakeFetcher::default().with(url, 500, "");

        let outcome = Store::new(tmp.path(), Family::Ssac).store(&fetcher, &record("SAC002", url));

        assert_eq!(outcome, StoreOutcome::Failed);
        assert!(!tmp.path().join("sac-002-en.pdf").exists());
    }
}
