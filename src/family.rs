use std::path::Path;

use url::Url;

use crate::extract::{EmbeddedJsonExtractor, Extractor, TableExtractor, TableShape};

/// The three ICANN document collections this tool mirrors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Ssac,
    Rssac,
    Octo,
}

/// Listing-page layout a family is published with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Table(TableShape),
    EmbeddedJson(&'static [&'static str]),
}

impl Family {
    /// Mirror order.
    pub const ALL: [Family; 3] = [Family::Ssac, Family::Rssac, Family::Octo];

    pub fn name(&self) -> &'static str {
        match self {
            Family::Ssac => "SSAC",
            Family::Rssac => "RSSAC",
            Family::Octo => "OCTO",
        }
    }

    /// Lowercase filename prefix of canonical names, e.g. `sac-036-en.pdf`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Family::Ssac => "sac",
            Family::Rssac => "rssac",
            Family::Octo => "octo",
        }
    }

    /// Leading part of a document id that the canonical name drops.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Family::Ssac => "SAC",
            Family::Rssac => "RSSAC",
            Family::Octo => "OCTO",
        }
    }

    /// Config key naming this family's directory.
    pub fn config_key(&self) -> &'static str {
        match self {
            Family::Ssac => "SSACDir",
            Family::Rssac => "RSSACDir",
            Family::Octo => "OCTODir",
        }
    }

    pub fn listing_url(&self) -> &'static str {
        match self {
            Family::Ssac => "https://www.icann.org/groups/ssac/documents",
            Family::Rssac => "https://www.icann.org/groups/rssac/documents",
            Family::Octo => "https://www.icann.org/resources/pages/octo-publications-2019-05-24-en",
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            Family::Ssac => Layout::Table(TableShape::Bracketed),
            Family::Rssac => Layout::Table(TableShape::Headed),
            Family::Octo => {
                Layout::EmbeddedJson(&["octo-publications", "page", "contentSummaries"])
            }
        }
    }

    pub fn extractor(&self) -> Box<dyn Extractor> {
        match self.layout() {
            Layout::Table(shape) => Box::new(TableExtractor::new(shape)),
            Layout::EmbeddedJson(key_path) => Box::new(EmbeddedJsonExtractor::new(key_path)),
        }
    }

    /// Width of the id column in the index file; also the hanging indent.
    pub fn index_column(&self) -> usize {
        match self {
            Family::Ssac => 8,
            Family::Rssac => 11,
            Family::Octo => 9,
        }
    }

    pub fn index_filename(&self) -> String {
        format!("{}-index.txt", self.prefix())
    }

    /// Local filename for a document fetched from `url`.
    ///
    /// Table families keep the remote basename. Pages on the JSON-published
    /// family end in a bare `-en` language suffix, so they get `.htm`.
    pub fn local_filename(&self, url: &Url) -> Option<String> {
        let base = url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())?;
        match self.layout() {
            Layout::EmbeddedJson(_) if base.ends_with("-en") => Some(format!("{base}.htm")),
            _ => Some(base.to_string()),
        }
    }

    /// Canonical name `<prefix>-<id suffix>-en.<ext>` for a stored file,
    /// or `None` when the id or the extension cannot supply the parts.
    pub fn canonical_name(&self, document_id: &str, filename: &str) -> Option<String> {
        let ext = Path::new(filename).extension()?.to_str()?;
        let id = document_id.trim();
        let head = id.get(..self.id_prefix().len())?;
        if !head.eq_ignore_ascii_case(self.id_prefix()) {
            return None;
        }
        let suffix = id[self.id_prefix().len()..]
            .trim_start_matches(['-', '_', ' '])
            .to_lowercase();
        if suffix.is_empty() {
            return None;
        }
        Some(format!("{}-{}-en.{}", self.prefix(), suffix, ext))
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
