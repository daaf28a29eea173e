use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::BlobStore;
use crate::error::Result;

/// Stores each key as `<key>.json` under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        // Replace the document atomically via a sibling file
        let path = self.path(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn last_saved(&self, key: &str) -> Option<DateTime<Utc>> {
        let modified = std::fs::metadata(self.path(key)).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}
