// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loading persisted state and debounced write-back.
//!
//! Mutations stage a JSON snapshot per key. The first staged write in a
//! window spawns a task that sleeps for the window and then writes the
//! latest snapshot of every staged key, so bursts of mutations cost one
//! write per key.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::db::{keys, namespaced, KvStore, StorageError, SCHEMA_VERSION};
use crate::models::{Run, Settings, Shoe, ShoeUsage};

/// Everything the store keeps on disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub runs: Vec<Run>,
    pub shoes: Vec<Shoe>,
    pub shoe_usage: HashMap<String, ShoeUsage>,
    pub settings: Settings,
}

impl PersistedState {
    /// Load all collections under `namespace`. Missing keys load as empty.
    ///
    /// A stored schema version other than the current one is logged and
    /// overwritten; the data itself is read as-is.
    pub async fn load(kv: &KvStore, namespace: &str) -> Result<Self, StorageError> {
        let version_key = namespaced(namespace, keys::SCHEMA_VERSION);
        match kv.get::<u32>(&version_key).await? {
            Some(SCHEMA_VERSION) => {}
            Some(found) => {
                tracing::warn!(
                    found,
                    expected = SCHEMA_VERSION,
                    "Schema version mismatch, overwriting"
                );
                kv.set(&version_key, &SCHEMA_VERSION).await?;
            }
            None => kv.set(&version_key, &SCHEMA_VERSION).await?,
        }

        let state = Self {
            runs: kv
                .get(&namespaced(namespace, keys::RUNS))
                .await?
                .unwrap_or_default(),
            shoes: kv
                .get(&namespaced(namespace, keys::SHOES))
                .await?
                .unwrap_or_default(),
            shoe_usage: kv
                .get(&namespaced(namespace, keys::SHOE_USAGE))
                .await?
                .unwrap_or_default(),
            settings: kv
                .get(&namespaced(namespace, keys::SETTINGS))
                .await?
                .unwrap_or_default(),
        };

        tracing::info!(
            runs = state.runs.len(),
            shoes = state.shoes.len(),
            "Loaded persisted state"
        );
        Ok(state)
    }
}

/// Debounced writer. Cheap to clone; clones share pending writes.
#[derive(Clone)]
pub struct DebouncedWriter {
    inner: Arc<WriterInner>,
}

struct WriterInner {
    kv: KvStore,
    namespace: String,
    window: Duration,
    pending: Mutex<HashMap<&'static str, Value>>,
    scheduled: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl DebouncedWriter {
    pub fn new(kv: KvStore, namespace: impl Into<String>, window: Duration) -> Self {
        Self {
            inner: Arc::new(WriterInner {
                kv,
                namespace: namespace.into(),
                window,
                pending: Mutex::new(HashMap::new()),
                scheduled: AtomicBool::new(false),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Stage `value` for `key` and make sure a write is scheduled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                let err = StorageError::Serialization(format!("{}: {}", key, e));
                self.record_error(&err);
                return;
            }
        };

        self.inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, value);

        self.arm();
    }

    /// Spawn the delayed flush unless one is already waiting.
    fn arm(&self) {
        if !self.inner.scheduled.swap(true, Ordering::AcqRel) {
            let writer = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(writer.inner.window).await;
                // Errors are recorded on the writer
                let _ = writer.flush().await;
            });
        }
    }

    /// Write everything staged so far, now.
    pub async fn flush(&self) -> Result<(), StorageError> {
        self.inner.scheduled.store(false, Ordering::Release);
        let pending: Vec<(&'static str, Value)> = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        let mut failed = Vec::new();
        let mut result = Ok(());
        for (key, value) in pending {
            let full_key = namespaced(&self.inner.namespace, key);
            match self.inner.kv.set_raw(&full_key, value.clone()).await {
                Ok(()) => tracing::debug!(key = %full_key, "Persisted"),
                Err(e) => {
                    self.record_error(&e);
                    failed.push((key, value));
                    result = Err(e);
                }
            }
        }

        if failed.is_empty() {
            if !self.has_pending() {
                self.clear_error();
            }
        } else {
            // Keep failed snapshots for the next attempt unless a newer one was staged
            let mut pending = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            for (key, value) in failed {
                pending.entry(key).or_insert(value);
            }
            drop(pending);
            tracing::warn!(
                window_ms = self.inner.window.as_millis() as u64,
                "Retrying failed writes"
            );
            self.arm();
        }
        result
    }

    /// Whether writes are staged but not yet flushed.
    pub fn has_pending(&self) -> bool {
        !self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Most recent write failure, cleared once every staged write has landed.
    pub fn last_error(&self) -> Option<String> {
        self.inner
            .last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record_error(&self, err: &StorageError) {
        tracing::error!(error = %err, "Failed to persist state");
        *self
            .inner
            .last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(err.to_string());
    }

    fn clear_error(&self) {
        self.inner
            .last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }
}
