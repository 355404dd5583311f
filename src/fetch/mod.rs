// src/fetch/mod.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::LAST_MODIFIED;
use tracing::debug;
use url::Url;

pub mod document;
pub mod listing;

pub use document::download_document;
pub use listing::fetch_listing;

/// What the mirror needs from one HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Transport failures are errors; HTTP error statuses
/// come back as a `Response` for the caller to judge.
pub trait Fetch {
    fn get(&self, url: &Url) -> Result<Response>;
}

/// Blocking `reqwest` client with the library's default timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("icann-docs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &Url) -> Result<Response> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("GET {}", url))?;
        let status = resp.status().as_u16();
        let last_modified = resp
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);
        let body = resp
            .bytes()
            .with_context(|| format!("reading body from {}", url))?
            .to_vec();
        Ok(Response {
            status,
            body,
            last_modified,
        })
    }
}

/// `Last-Modified` values are IMF-fixdate, which RFC 2822 parsing accepts.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned responses and remembers every URL requested.
    /// Unknown URLs fail like a refused connection.
    #[derive(Default)]
    pub struct FakeFetcher {
        responses: HashMap<String, Response>,
        pub requests: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn with(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
            self.responses.insert(
                url.to_string(),
                Response {
                    status,
                    body: body.into(),
                    last_modified: None,
                },
            );
            self
        }

        pub fn with_response(mut self, url: &str, response: Response) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }

        pub fn requested(&self, url: &str) -> bool {
            self.requests.borrow().iter().any(|u| u == url)
        }
    }

    impl Fetch for FakeFetcher {
        fn get(&self, url: &Url) -> Result<Response> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("connection refused: {}", url))
        }
    }
}
