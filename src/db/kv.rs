// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-value store for JSON documents.
//!
//! Three backends:
//! - memory (tests, ephemeral runs)
//! - directory (one JSON file per key)
//! - offline (every call fails, for exercising error paths)

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key-value store handle. Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct KvStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Memory(Arc<DashMap<String, Value>>),
    Directory(PathBuf),
    Offline,
}

impl KvStore {
    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Store backed by a directory, created if missing.
    pub async fn open_dir(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), "Opened storage directory");
        Ok(Self {
            backend: Backend::Directory(path),
        })
    }

    /// Create an offline store for testing.
    ///
    /// All operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    // ─── Raw Operations ──────────────────────────────────────────

    /// Read the JSON stored under `key`.
    pub async fn get_raw(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match &self.backend {
            Backend::Memory(map) => Ok(map.get(key).map(|v| v.value().clone())),
            Backend::Directory(dir) => {
                let path = file_for(dir, key);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => serde_json::from_slice(&bytes)
                        .map(Some)
                        .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e))),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(StorageError::Io(format!("{}: {}", path.display(), e))),
                }
            }
            Backend::Offline => Err(StorageError::Offline),
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    pub async fn set_raw(&self, key: &str, value: Value) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Memory(map) => {
                map.insert(key.to_string(), value);
                Ok(())
            }
            Backend::Directory(dir) => {
                let path = file_for(dir, key);
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e)))?;

                // Write then rename so a crash never leaves a torn file
                let tmp = path.with_extension("json.tmp");
                tokio::fs::write(&tmp, bytes)
                    .await
                    .map_err(|e| StorageError::Io(format!("{}: {}", tmp.display(), e)))?;
                tokio::fs::rename(&tmp, &path)
                    .await
                    .map_err(|e| StorageError::Io(format!("{}: {}", path.display(), e)))
            }
            Backend::Offline => Err(StorageError::Offline),
        }
    }

    /// Remove `key`. Removing a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Memory(map) => {
                map.remove(key);
                Ok(())
            }
            Backend::Directory(dir) => {
                let path = file_for(dir, key);
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(StorageError::Io(format!("{}: {}", path.display(), e))),
                }
            }
            Backend::Offline => Err(StorageError::Offline),
        }
    }

    // ─── Typed Operations ────────────────────────────────────────

    /// Read and deserialize the value under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_raw(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Serialize and store `value` under `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)
            .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e)))?;
        self.set_raw(key, value).await
    }
}

/// File holding `key`. Characters outside `[A-Za-z0-9._-]` map to `_`.
fn file_for(dir: &Path, key: &str) -> PathBuf {
    let name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{}.json", name))
}

/// Storage errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Storage serialization error: {0}")]
    Serialization(String),

    #[error("Storage not available (offline mode)")]
    Offline,
}
