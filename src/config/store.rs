//! Keyed preference storage
//!
//! Records are keyed by role ("main"/"canvas"). The file-backed store keeps
//! them in a single JSON object under the per-user data directory.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::RolePreference;
use crate::error::ConfigError;

/// Keyed record store with get / upsert semantics
pub trait PreferenceStore {
    /// Read one record; `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<RolePreference>, ConfigError>;

    /// Insert or replace one record
    fn put(&mut self, key: &str, value: &RolePreference) -> Result<(), ConfigError>;
}

type Document = BTreeMap<String, RolePreference>;

/// JSON file store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Default location: `<data dir>/display-roles/preferences.json`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    pub fn open_default() -> Self {
        Self::at(Self::default_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole document, `Ok(None)` if the file doesn't exist yet
    fn read_document(&self) -> Result<Option<Document>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ConfigError::StoreFailure(format!("failed to read {}: {e}", self.path.display()))
        })?;

        let document = serde_json::from_str::<Document>(&contents).map_err(|e| {
            ConfigError::StoreFailure(format!("failed to parse {}: {e}", self.path.display()))
        })?;

        Ok(Some(document))
    }

    fn write_document(&self, document: &Document) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::StoreFailure(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| ConfigError::StoreFailure(format!("failed to serialize preferences: {e}")))?;

        fs::write(&self.path, json).map_err(|e| {
            ConfigError::StoreFailure(format!("failed to write {}: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), "Wrote preference file");
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<RolePreference>, ConfigError> {
        Ok(self
            .read_document()?
            .and_then(|mut document| document.remove(key)))
    }

    fn put(&mut self, key: &str, value: &RolePreference) -> Result<(), ConfigError> {
        // Keep the other keys; a broken file is replaced rather than blocking the write
        let mut document = match self.read_document() {
            Ok(document) => document.unwrap_or_default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Replacing unreadable preference file");
                Document::new()
            }
        };

        document.insert(key.to_string(), value.clone());
        self.write_document(&document)?;
        info!(key = %key, path = %self.path.display(), "Saved preference");
        Ok(())
    }
}

/// In-process store for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, RolePreference>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, key: &str, value: RolePreference) -> Self {
        self.records.insert(key.to_string(), value);
        self
    }

    /// Make every `get` fail
    #[cfg(test)]
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Make every `put` fail
    #[cfg(test)]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Number of successful `put` calls
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<RolePreference>, ConfigError> {
        if self.fail_reads {
            return Err(ConfigError::StoreFailure(format!("read of '{key}' rejected")));
        }
        Ok(self.records.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &RolePreference) -> Result<(), ConfigError> {
        if self.fail_writes {
            return Err(ConfigError::StoreFailure(format!("write of '{key}' rejected")));
        }
        self.records.insert(key.to_string(), value.clone());
        self.writes += 1;
        Ok(())
    }
}
