use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::parser::publications::parse_publications;
use crate::parser::roster::{parse_roster, RosterEntry};

/// Source of page bodies, decoded as UTF-8.
pub trait PageSource {
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        // Served charset is ignored; the site is UTF-8.
        let body = response.bytes()?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Fetch the roster page. A page without a table yields no entries.
pub fn fetch_roster(source: &impl PageSource, url: &str) -> Result<Vec<RosterEntry>, FetchError> {
    info!("Fetching roster: {}", url);
    let html = source.get(url)?;
    match parse_roster(&html) {
        Ok(entries) => {
            info!("Roster rows with a staff link: {}", entries.len());
            Ok(entries)
        }
        Err(e) => {
            warn!(%url, "{}, check the roster page structure", e);
            Ok(Vec::new())
        }
    }
}

/// Fetch a publication-list page. A page without the publication table yields no titles.
pub fn fetch_publications(source: &impl PageSource, url: &str) -> Result<Vec<String>, FetchError> {
    let html = source.get(url)?;
    match parse_publications(&html) {
        Ok(titles) => Ok(titles),
        Err(e) => {
            warn!(%url, "{}, check the publication page structure", e);
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;

    use super::PageSource;
    use crate::error::FetchError;

    /// Pages served from memory; unknown URLs answer 404.
    #[derive(Default)]
    pub struct StaticPages(pub HashMap<String, String>);

    impl StaticPages {
        pub fn with(mut self, url: &str, html: &str) -> Self {
            self.0.insert(url.to_string(), html.to_string());
            self
        }
    }

    impl PageSource for StaticPages {
        fn get(&self, url: &str) -> Result<String, FetchError> {
            self.0.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::StaticPages;
    use super::*;

    #[test]
    fn roster_without_table_is_empty() {
        let pages = StaticPages::default().with("http://site/roster", "<p>no table</p>");
        assert!(fetch_roster(&pages, "http://site/roster").unwrap().is_empty());
    }

    #[test]
    fn roster_http_failure_propagates() {
        let pages = StaticPages::default();
        let err = fetch_roster(&pages, "http://site/roster").unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn publications_without_table_are_empty() {
        let pages = StaticPages::default().with("http://site/pubs", "<table><tr><td><b>x</b></td></tr></table>");
        assert!(fetch_publications(&pages, "http://site/pubs").unwrap().is_empty());
    }

    #[test]
    fn publications_are_extracted() {
        let html = std::fs::read_to_string("tests/fixtures/publications.html").unwrap();
        let pages = StaticPages::default().with("http://site/pubs", &html);
        let titles = fetch_publications(&pages, "http://site/pubs").unwrap();
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[0], "Adaptive control of distributed systems");
    }
}
