//! Error types for a synchronization run.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The dataset file could not be read or written.
    #[error("dataset storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset file exists but does not hold a valid mapping.
    #[error("dataset at {} is malformed: {source}", .path.display())]
    MalformedDataset {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An endpoint could not be built from the configured base url.
    #[error("cannot join {path:?} onto base url {base}: {source}")]
    InvalidUrl {
        base: String,
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// The remote answered with something other than 200.
    #[error("{url} responded with {status}")]
    Remote { url: String, status: StatusCode },

    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl Error {
    /// Whether the error came from the dataset file rather than the network.
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::MalformedDataset { .. })
    }
}
