//! Persisted UI state behind an injectable port.
//!
//! The report page keeps a handful of string preferences (last output format,
//! collapsed sections, dismissed banners). Callers receive a [`StoragePort`]
//! rather than reaching for a global, so tests use [`MemoryStorage`] and the
//! CLI uses [`FileStorage`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{StorageError, StorageResult};

// ── StoragePort trait ───────────────────────────────────────────────────

/// A flat string key/value store.
pub trait StoragePort: Send {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Returns whether it was present.
    fn remove(&mut self, key: &str) -> StorageResult<bool>;

    /// Remove every key.
    fn clear(&mut self) -> StorageResult<()>;

    /// All keys in sorted order.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

// ── MemoryStorage ───────────────────────────────────────────────────────

/// In-process store; nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.entries.clear();
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

// ── FileStorage ─────────────────────────────────────────────────────────

/// A JSON object file, rewritten in full on every change.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let entries: BTreeMap<String, String> = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| StorageError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened preference store");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> StorageResult<()> {
        let write_err = |path: &Path, e: std::io::Error| StorageError::Write {
            path: path.display().to_string(),
            source: e,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
        }
        let content = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            StorageError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|e| write_err(tmp.as_path(), e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| write_err(self.path.as_path(), e))
    }
}

impl StoragePort for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.entries.clear();
        self.persist()
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}
