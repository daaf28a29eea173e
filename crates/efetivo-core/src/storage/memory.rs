use std::collections::HashMap;
use std::io;

use chrono::{DateTime, Utc};

use super::BlobStore;
use crate::error::Result;

/// In-memory store. Can be switched to reject writes, which makes
/// persistence failures reproducible.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, (String, DateTime<Utc>)>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `put` fails with a permission error.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|(value, _)| value.clone()))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        if self.read_only {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only").into());
        }
        self.entries
            .insert(key.to_string(), (value.to_string(), Utc::now()));
        Ok(())
    }

    fn last_saved(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|(_, at)| *at)
    }
}
