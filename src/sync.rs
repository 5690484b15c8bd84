use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::client::ComicSource;
use crate::comic::ComicId;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::storage::JsonFileStore;

/// xkcd 404 was never published; its URL returns a real 404.
pub const SKIP_ID: ComicId = 404;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub known_max: ComicId,
    pub remote_max: ComicId,
    pub fetched: Vec<ComicId>,
    pub failed: Vec<ComicId>,
    pub skipped: bool,
}

impl SyncReport {
    pub fn is_up_to_date(&self) -> bool {
        self.remote_max <= self.known_max
    }
}

pub struct Synchronizer<'a, S> {
    source: &'a S,
    delay: Duration,
    sleep: Box<dyn Fn(Duration) + 'a>,
}

impl<'a, S: ComicSource> Synchronizer<'a, S> {
    pub fn new(source: &'a S, delay: Duration) -> Self {
        Self {
            source,
            delay,
            sleep: Box::new(thread::sleep),
        }
    }

    /// Replaces the `thread::sleep` used between fetches.
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + 'a) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Fetches every comic above the dataset's highest id, newest first.
    ///
    /// Only the trailing edge moves forward: a comic that fails here is left
    /// out, and once a higher id is stored, later runs will not revisit it.
    pub fn synchronize(&self, dataset: &mut Dataset) -> Result<SyncReport> {
        let known_max = dataset.max_id();
        let remote_max = self.source.fetch_latest_id()?;
        info!("dataset is at comic {known_max}, remote is at {remote_max}");

        let mut report = SyncReport {
            known_max,
            remote_max,
            ..SyncReport::default()
        };

        for id in (known_max.saturating_add(1)..=remote_max).rev() {
            if id == SKIP_ID {
                debug!("skipping comic id [{id}]");
                report.skipped = true;
                continue;
            }

            match self.source.fetch_entry(id) {
                Ok(entry) => {
                    info!(
                        "fetched comic id [{}]: \"{}\" ({})",
                        entry.id,
                        entry.title,
                        entry.display_date().unwrap_or_else(|| entry.date.to_string())
                    );
                    report.fetched.push(entry.id);
                    dataset.insert(entry);
                }
                Err(err) => {
                    warn!("could not fetch comic id [{id}]: {err}");
                    report.failed.push(id);
                }
            }

            (self.sleep)(self.delay);
        }

        Ok(report)
    }
}

/// Loads the dataset, brings it up to date and writes it back. Nothing is
/// written if loading or the latest-id lookup fails.
pub fn run<S: ComicSource>(
    store: &JsonFileStore,
    source: &S,
    delay: Duration,
) -> Result<SyncReport> {
    let mut dataset = store.load()?;
    let report = Synchronizer::new(source, delay).synchronize(&mut dataset)?;
    store.persist(&dataset)?;

    if report.is_up_to_date() {
        info!("already up to date at comic {}", report.known_max);
    } else {
        info!(
            "synced {} comics ({} failed), dataset now holds {}",
            report.fetched.len(),
            report.failed.len(),
            dataset.len()
        );
    }
    if !report.failed.is_empty() {
        warn!("comics left out this run: {:?}", report.failed);
    }
    Ok(report)
}
