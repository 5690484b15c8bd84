use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// The dataset as a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Dataset> {
        let raw = fs::read(&self.path).map_err(|source| self.storage_error(source))?;
        let dataset: Dataset =
            serde_json::from_slice(&raw).map_err(|source| Error::MalformedDataset {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            "loaded {} comics from {}",
            dataset.len(),
            self.path.display()
        );
        Ok(dataset)
    }

    /// Replaces the file with `dataset`. Readers see either the old or the new
    /// contents, never a partial write.
    pub fn persist(&self, dataset: &Dataset) -> Result<()> {
        let bytes = encode(dataset).map_err(|source| Error::MalformedDataset {
            path: self.path.clone(),
            source,
        })?;
        self.write_atomic(&bytes)
            .map_err(|source| self.storage_error(source))?;
        debug!("wrote {} comics to {}", dataset.len(), self.path.display());
        Ok(())
    }

    fn write_atomic(&self, data: &[u8]) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp_path = self.path.with_extension(format!("tmp.{}", std::process::id()));
        let written = write_then_rename(&tmp_path, &self.path, data);
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }

    fn storage_error(&self, source: std::io::Error) -> Error {
        Error::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_then_rename(tmp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut f = fs::File::create(tmp_path)?;
    f.write_all(data)?;
    f.sync_all()?;
    fs::rename(tmp_path, path)
}

/// Four-space indentation; slashes are never escaped by serde_json.
///
/// Non-ASCII text is written as raw UTF-8. Datasets written by PHP's
/// `json_encode` hold `\uXXXX` escapes instead, so the first rewrite of such a
/// file changes those bytes while the decoded strings stay the same.
fn encode(dataset: &Dataset) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    dataset.serialize(&mut ser)?;
    Ok(buf)
}
