//! Typed errors for the cases callers need to tell apart. Everything else
//! travels as `anyhow::Error`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures loading the local show index file.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("TV shows file not found at {0}, please refresh the list")]
    Missing(PathBuf),
    #[error("error decoding the TV shows file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Page-structure failures on the scraping paths that cannot degrade to an
/// empty value.
#[derive(Debug, Error)]
pub enum GuideError {
    #[error("element not found on {page}: {element}")]
    MissingElement {
        page: String,
        element: &'static str,
    },
    #[error("HTTP error {status} fetching {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}
