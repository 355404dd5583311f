// src/fetch/document.rs

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::path::Path;
use std::time::SystemTime;
use tracing::warn;
use url::Url;

use super::Fetch;

/// Download `url` and save it at `dest`. When the server reported a
/// `Last-Modified` time it becomes the file's modification time; failing
/// to apply it is logged and the download still counts.
pub fn download_document(fetcher: &dyn Fetch, url: &Url, dest: &Path) -> Result<()> {
    let resp = fetcher.get(url)?;
    if !resp.is_success() {
        bail!("HTTP {} from {}", resp.status, url);
    }

    if let Err(e) = fs::write(dest, &resp.body) {
        // a partial file would pass the next run's existence check
        let _ = fs::remove_file(dest);
        return Err(e).with_context(|| format!("writing {}", dest.display()));
    }

    if let Some(modified) = resp.last_modified {
        apply_remote_mtime(dest, modified.into());
    }
    Ok(())
}

/// Stamp `dest` with the server's modification time. The body is already
/// saved, so a failure here is only logged.
fn apply_remote_mtime(dest: &Path, modified: SystemTime) -> bool {
    match File::options()
        .write(true)
        .open(dest)
        .and_then(|f| f.set_modified(modified))
    {
        Ok(()) => true,
        Err(e) => {
            warn!(file = %dest.display(), error = %e, "could not set modification time");
            false
        }
    }
}
