use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::sync::Mutex;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use tempfile::Builder;

use crate::error::DictError;

/// Durable client-side key-value storage. Values are opaque strings; each key
/// holds one record.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DictError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DictError>;
    fn remove(&self, key: &str) -> Result<(), DictError>;
}

/// One `<key>.json` file per record under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: Utf8PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn record_path(&self, key: &str) -> Result<Utf8PathBuf, DictError> {
        let is_valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !is_valid {
            return Err(DictError::Storage(format!("invalid record key: {key}")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    pub fn ensure_root(&self) -> Result<(), DictError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| DictError::Storage(err.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, DictError> {
        let path = self.record_path(key)?;
        match fs::read_to_string(path.as_std_path()) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(DictError::Storage(format!("read {path}: {err}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DictError> {
        let path = self.record_path(key)?;
        self.ensure_root()?;
        let mut temp = Builder::new()
            .prefix("offline-dict-record")
            .tempfile_in(self.root.as_std_path())
            .map_err(|err| DictError::Storage(err.to_string()))?;
        temp.write_all(value.as_bytes())
            .map_err(|err| DictError::Storage(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| DictError::Storage(err.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DictError> {
        let path = self.record_path(key)?;
        match fs::remove_file(path.as_std_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(DictError::Storage(format!("remove {path}: {err}"))),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DictError> {
        let records = self
            .records
            .lock()
            .map_err(|_| DictError::Storage("memory store poisoned".to_string()))?;
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DictError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| DictError::Storage("memory store poisoned".to_string()))?;
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DictError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| DictError::Storage("memory store poisoned".to_string()))?;
        records.remove(key);
        Ok(())
    }
}

/// `<platform data dir>/offline-dict`, e.g. `~/.local/share/offline-dict`.
pub fn default_data_dir() -> Result<Utf8PathBuf, DictError> {
    BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.data_dir().join("offline-dict")).ok())
        .ok_or_else(|| DictError::Storage("unable to resolve data directory".to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn record_path_layout() {
        let store = FileStore::new("/tmp/offline-dict");
        let path = store.record_path("searchHistory").unwrap();
        assert!(path.ends_with("offline-dict/searchHistory.json"));
    }

    #[test]
    fn record_key_rejects_traversal() {
        let store = FileStore::new("/tmp/offline-dict");
        let err = store.record_path("../etc/passwd").unwrap_err();
        assert_matches!(err, DictError::Storage(_));
    }
}
