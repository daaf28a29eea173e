//! Persistence: a string key-value blob store holding JSON documents.
//!
//! - `FileStore`: one `<key>.json` file per key under a data directory
//! - `MemoryStore`: in-process store for tests and throwaway sessions
//! - `migrate`: load-time normalization of legacy configuration entries

pub mod file;
pub mod memory;
pub mod migrate;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{EfetivoError, Result};

pub const ROSTER_KEY: &str = "efetivo_dados";
pub const CONFIG_KEY: &str = "efetivo_config";
pub const PREDICTED_KEY: &str = "ddqod_previsto";
pub const GROUPS_KEY: &str = "ddqod_grupos";
pub const INFO_KEY: &str = "ddqod_info";

/// A key-value store of serialized documents.
pub trait BlobStore {
    /// Stored text for `key`, or `None` if nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    /// When `key` was last written, if known.
    fn last_saved(&self, key: &str) -> Option<DateTime<Utc>>;
}

/// Independently persisted parts of the application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Roster,
    Config,
    Predicted,
    Groups,
    Info,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Roster,
        Section::Config,
        Section::Predicted,
        Section::Groups,
        Section::Info,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Section::Roster => ROSTER_KEY,
            Section::Config => CONFIG_KEY,
            Section::Predicted => PREDICTED_KEY,
            Section::Groups => GROUPS_KEY,
            Section::Info => INFO_KEY,
        }
    }
}

/// Read and parse a document. Missing keys yield `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Result<Option<T>> {
    let Some(contents) = store.get(key)? else {
        debug!(key, "No stored document");
        return Ok(None);
    };
    let value = serde_json::from_str(&contents).map_err(|source| EfetivoError::Corrupt {
        key: key.to_string(),
        source,
    })?;
    debug!(key, bytes = contents.len(), "Loaded stored document");
    Ok(Some(value))
}

pub fn save_json<T: Serialize + ?Sized>(store: &mut dyn BlobStore, key: &str, value: &T) -> Result<()> {
    let contents = serde_json::to_string(value).map_err(std::io::Error::from)?;
    store.put(key, &contents)?;
    debug!(key, bytes = contents.len(), "Saved document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DdqodInfo;

    #[test]
    fn test_load_missing_key() {
        let store = MemoryStore::new();
        let loaded: Option<DdqodInfo> = load_json(&store, INFO_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let info = DdqodInfo {
            description: "QO 2025".to_string(),
            last_updated: "2025-01-10".to_string(),
        };
        save_json(&mut store, INFO_KEY, &info).unwrap();
        let loaded: Option<DdqodInfo> = load_json(&store, INFO_KEY).unwrap();
        assert_eq!(loaded, Some(info));
        assert!(store.last_saved(INFO_KEY).is_some());
    }

    #[test]
    fn test_corrupt_document() {
        let mut store = MemoryStore::new();
        store.put(INFO_KEY, "{not json").unwrap();
        let err = load_json::<DdqodInfo>(&store, INFO_KEY).unwrap_err();
        assert!(matches!(err, EfetivoError::Corrupt { ref key, .. } if key == INFO_KEY));
    }

    #[test]
    fn test_section_keys() {
        let keys: Vec<&str> = Section::ALL.iter().map(Section::key).collect();
        assert_eq!(
            keys,
            vec!["efetivo_dados", "efetivo_config", "ddqod_previsto", "ddqod_grupos", "ddqod_info"]
        );
    }
}
