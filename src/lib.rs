//! Incremental sync of xkcd comic metadata into a local JSON dataset.

pub mod client;
pub mod comic;
pub mod config;
pub mod dataset;
pub mod error;
pub mod storage;
pub mod sync;

pub use client::{ComicSource, XkcdClient};
pub use comic::{ComicId, Entry};
pub use config::Config;
pub use dataset::{Dataset, DatasetKey};
pub use error::{Error, Result};
pub use storage::JsonFileStore;
pub use sync::{SKIP_ID, SyncReport, Synchronizer};
