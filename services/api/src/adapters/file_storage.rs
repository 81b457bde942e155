//! services/api/src/adapters/file_storage.rs
//!
//! A `KeyValueStorage` kept in a single JSON object file, standing in for a
//! browser's local storage so the console's session survives between runs.

use commodities_core::ports::{KeyValueStorage, PortError, PortResult};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

type Items = BTreeMap<String, String>;

/// File-backed storage. Every call reads the file afresh; writes replace it whole.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is empty storage. An unreadable or malformed one is an error.
    fn read_items(&self) -> PortResult<Items> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Items::new()),
            Err(e) => {
                return Err(PortError::Unavailable(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| PortError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    /// Items to write over. A corrupt file is discarded rather than blocking writes.
    fn items_for_write(&self) -> PortResult<Items> {
        match self.read_items() {
            Err(PortError::Corrupt(reason)) => {
                warn!("Replacing corrupt storage file ({}).", reason);
                Ok(Items::new())
            }
            other => other,
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves a torn file.
    fn write_items(&self, items: &Items) -> PortResult<()> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                PortError::Unavailable(format!("writing {}: {}", self.path.display(), e))
            })
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.read_items()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        let mut items = self.items_for_write()?;
        items.insert(key.to_string(), value.to_string());
        self.write_items(&items)
    }

    fn remove_item(&self, key: &str) -> PortResult<()> {
        let mut items = self.items_for_write()?;
        if items.remove(key).is_some() {
            self.write_items(&items)?;
        }
        Ok(())
    }
}
