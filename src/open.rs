//! Open locally mirrored documents by number.

use anyhow::{bail, Context, Result};
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::error::Error;
use crate::family::Family;

/// Something that can show a file to the user.
pub trait Viewer {
    fn open(&self, path: &Path) -> Result<()>;
}

/// The platform's "open with the default application" command.
#[derive(Debug, Clone, Copy)]
pub struct SystemViewer {
    program: &'static str,
    args: &'static [&'static str],
}

impl SystemViewer {
    pub fn detect() -> Result<Self, Error> {
        if cfg!(target_os = "macos") {
            Ok(Self {
                program: "open",
                args: &[],
            })
        } else if cfg!(windows) {
            Ok(Self {
                program: "cmd",
                args: &["/C", "start", ""],
            })
        } else if cfg!(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            Ok(Self {
                program: "xdg-open",
                args: &[],
            })
        } else {
            Err(Error::UnsupportedPlatform(std::env::consts::OS))
        }
    }
}

impl Viewer for SystemViewer {
    fn open(&self, path: &Path) -> Result<()> {
        debug!(program = self.program, path = %path.display(), "opening");
        let status = Command::new(self.program)
            .args(self.args)
            .arg(path)
            .status()
            .with_context(|| format!("running {}", self.program))?;
        if !status.success() {
            bail!("{} {} exited with {}", self.program, path.display(), status);
        }
        Ok(())
    }
}

/// A user's request for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Index,
    /// More than three characters: matched as written, version or part
    /// suffix included.
    Exact(String),
    /// Up to three digits, zero padded.
    Number(u32),
}

impl Token {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedToken {
            token: raw.to_string(),
        };
        if raw == "index" {
            return Ok(Token::Index);
        }
        if raw.len() > 3 {
            let ok = raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
            return if ok {
                Ok(Token::Exact(raw.to_ascii_lowercase()))
            } else {
                Err(malformed())
            };
        }
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }
        raw.parse().map(Token::Number).map_err(|_| malformed())
    }
}

/// What an open request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened(Vec<PathBuf>),
    NotFound,
}

/// Open the family's files in `dir` that match `raw_token`.
pub fn open_document(
    viewer: &dyn Viewer,
    family: Family,
    dir: &Path,
    raw_token: &str,
) -> Result<OpenOutcome> {
    match Token::parse(raw_token)? {
        Token::Index => {
            let path = dir.join(family.index_filename());
            viewer.open(&path)?;
            Ok(OpenOutcome::Opened(vec![path]))
        }
        Token::Exact(token) => {
            let matches = matching(dir, &format!("{}-{}*.*", family.prefix(), token))?;
            if matches.len() != 1 {
                return Err(Error::AmbiguousDocument {
                    prefix: family.prefix(),
                    token,
                    matches: matches.iter().map(|p| file_name(p)).collect(),
                }
                .into());
            }
            viewer.open(&matches[0])?;
            Ok(OpenOutcome::Opened(matches))
        }
        Token::Number(n) => {
            let matches = matching(dir, &format!("{}-{:03}*-en.*", family.prefix(), n))?;
            if matches.is_empty() {
                println!("No published {} document for {:03}.", family, n);
                return Ok(OpenOutcome::NotFound);
            }
            let several = matches.len() > 1;
            for path in &matches {
                if several {
                    println!("Opening {}", file_name(path));
                }
                viewer.open(path)?;
            }
            Ok(OpenOutcome::Opened(matches))
        }
    }
}

/// Entries in `dir` matching a filename glob, sorted by name.
fn matching(dir: &Path, file_pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&dir.to_string_lossy()),
        file_pattern
    );
    let mut found: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("invalid glob pattern {}", pattern))?
        .filter_map(Result::ok)
        .collect();
    found.sort();
    Ok(found)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
