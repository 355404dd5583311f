//! Mirror ICANN's SSAC, RSSAC and OCTO publications into local directories
//! and open the cached copies by document number.
//!
//! The mirror pipeline is: fetch the family's listing page, extract the
//! document records, download whatever is not on disk yet (adding a
//! canonical-name symlink and cleaning HTML pages as it goes), then rebuild
//! the plain-text index when anything new arrived.

pub mod alias;
pub mod config;
pub mod error;
pub mod extract;
pub mod family;
pub mod fetch;
pub mod index;
pub mod mirror;
pub mod open;
pub mod record;
pub mod sanitize;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use family::Family;
pub use record::{DocumentRecord, Listing};
