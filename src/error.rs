use std::time::Duration;

use thiserror::Error;

use crate::browser::NavState;

/// A display name that does not split into a first and last name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("name has no separable first and last part: {raw:?}")]
pub struct MalformedName {
    pub raw: String,
}

/// An expected structure is missing from a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no table found on page")]
    MissingTable,
    #[error("no table with class `{0}` found on page")]
    MissingStyledTable(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum NavError {
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },
    #[error("browser error: {0}")]
    Browser(String),
    #[error("navigator is {actual:?}, expected {expected:?}")]
    OutOfStep { expected: NavState, actual: NavState },
    #[error("expected {expected}, browser shows {actual}")]
    WrongPage { expected: String, actual: String },
    #[error("could not return the browser to the roster: {0}")]
    Lost(String),
}

/// Failure of a single roster record. Never fatal to the crawl.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Nav(#[from] NavError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
