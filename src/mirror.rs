//! One mirror run per family: listing, downloads, index.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::info;

use crate::config::Config;
use crate::family::Family;
use crate::fetch::{fetch_listing, Fetch};
use crate::index::write_index;
use crate::store::{Store, StoreOutcome};

/// Summary of one family's run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub listed: usize,
    pub fetched: Vec<String>,
    pub already_present: usize,
    pub failed: usize,
    pub aliases: Vec<String>,
    pub index_written: bool,
}

pub struct Mirror<'a> {
    fetcher: &'a dyn Fetch,
    config: &'a Config,
    today: NaiveDate,
}

impl<'a> Mirror<'a> {
    pub fn new(fetcher: &'a dyn Fetch, config: &'a Config) -> Self {
        Self {
            fetcher,
            config,
            today: Local::now().date_naive(),
        }
    }

    /// Date printed in index headers.
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Mirror every family in turn; the first listing failure ends the run.
    pub fn run_all(&self) -> Result<Vec<(Family, MirrorReport)>> {
        let mut reports = Vec::with_capacity(Family::ALL.len());
        for family in Family::ALL {
            let report = self.run(family)?;
            reports.push((family, report));
        }
        Ok(reports)
    }

    pub fn run(&self, family: Family) -> Result<MirrorReport> {
        info!("Starting {} documents", family);
        let dir = self.config.dir(family);

        let page = fetch_listing(self.fetcher, family)?;
        let listing = family
            .extractor()
            .extract(&page)
            .with_context(|| format!("reading the ICANN {} documents web page", family))?;

        let store = Store::new(dir, family);
        let mut report = MirrorReport {
            listed: listing.len(),
            ..Default::default()
        };
        for record in listing.values() {
            match store.store(self.fetcher, record) {
                StoreOutcome::AlreadyPresent(_) => report.already_present += 1,
                StoreOutcome::Fetched { path, alias } => {
                    report
                        .fetched
                        .push(path.file_name().unwrap_or_default().to_string_lossy().into_owned());
                    report.aliases.extend(alias);
                }
                StoreOutcome::Failed => report.failed += 1,
            }
        }

        // The index follows the current listing, not the directory contents.
        if !report.fetched.is_empty() {
            write_index(dir, family, &listing, self.today)?;
            report.index_written = true;
        }

        info!(
            family = %family,
            listed = report.listed,
            fetched = report.fetched.len(),
            present = report.already_present,
            failed = report.failed,
            index = report.index_written,
            "done"
        );
        Ok(report)
    }
}
