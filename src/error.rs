use std::path::PathBuf;

use thiserror::Error;

/// Failures that end a command with a non-zero exit status.
///
/// Everything else travels as `anyhow::Error` with context attached; these
/// variants exist so callers can tell the cases apart.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not find a icann.config file (looked in {})", display_paths(.searched))]
    ConfigNotFound { searched: Vec<PathBuf> },

    #[error("could not open {} config file", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{var} not set by {}", .path.display())]
    MissingDirectory { var: &'static str, path: PathBuf },

    #[error("{var} = {} (from {}) is not a directory", .dir.display(), .path.display())]
    NotADirectory {
        var: &'static str,
        dir: PathBuf,
        path: PathBuf,
    },

    #[error("unable to fetch ICANN {family} documents web page (HTTP {status})")]
    ListingStatus { family: &'static str, status: u16 },

    #[error("second argument must be 'index' or a document number, got '{token}'")]
    MalformedToken { token: String },

    #[error("expected exactly one {prefix}-{token}*.* document, found {}{}", .matches.len(), list_names(.matches))]
    AmbiguousDocument {
        prefix: &'static str,
        token: String,
        matches: Vec<String>,
    },

    #[error("opening files is not supported on this platform ({0})")]
    UnsupportedPlatform(&'static str),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_names(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!(": {}", names.join(", "))
    }
}
