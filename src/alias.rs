use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tracing::debug;

use crate::family::Family;

/// Give a stored file whose name does not follow `<prefix>-...` a second
/// entry under its canonical name. Returns the link name when one was made.
///
/// An existing entry at the canonical path, even a dangling link, is left
/// alone.
pub fn ensure_alias(
    dir: &Path,
    family: Family,
    document_id: &str,
    filename: &str,
) -> Result<Option<String>> {
    if filename.starts_with(&format!("{}-", family.prefix())) {
        return Ok(None);
    }
    let Some(canonical) = family.canonical_name(document_id, filename) else {
        debug!(id = document_id, filename, "no canonical name");
        return Ok(None);
    };

    let link = dir.join(&canonical);
    if link.symlink_metadata().is_ok() {
        debug!(link = %link.display(), "alias already present");
        return Ok(None);
    }

    symlink(Path::new(filename), &link)
        .with_context(|| format!("linking {} -> {}", link.display(), filename))?;
    Ok(Some(canonical))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
