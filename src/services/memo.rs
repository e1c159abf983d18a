// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TTL memoization for expensive derived selectors.
//!
//! Entries are keyed by a selector name plus a SHA-256 of the JSON-encoded
//! arguments. Values live behind `Arc`, so a cache hit hands back the same
//! allocation the first call produced.

use crate::clock::SharedClock;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::sync::Arc;

/// Default time-to-live for memoized values.
pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// `(selector name, args hash)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub function: &'static str,
    pub args_hash: String,
}

impl CacheKey {
    pub fn new<A: Serialize + ?Sized>(function: &'static str, args: &A) -> Self {
        // Serializing plain ids/tuples cannot fail; fall back to an empty payload.
        let payload = serde_json::to_vec(args).unwrap_or_default();
        let digest = Sha256::digest(&payload);
        Self {
            function,
            args_hash: hex::encode(digest),
        }
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: DateTime<Utc>,
}

/// Memoization cache shared by the store's selectors.
pub struct MemoCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: SharedClock,
}

impl MemoCache {
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Return the cached value for `(function, args)` or compute and store it.
    pub fn get_or_compute<T, A, F>(&self, function: &'static str, args: &A, compute: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        A: Serialize + ?Sized,
        F: FnOnce() -> T,
    {
        let key = CacheKey::new(function, args);
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(&key) {
            if now < entry.expires_at {
                if let Ok(value) = Arc::clone(&entry.value).downcast::<T>() {
                    tracing::trace!(function, "Memo cache hit");
                    return value;
                }
            }
        }

        tracing::trace!(function, "Memo cache miss");
        let value = Arc::new(compute());
        self.entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                expires_at: now + self.ttl,
            },
        );
        value
    }

    /// Evict one entry.
    pub fn invalidate<A: Serialize + ?Sized>(&self, function: &'static str, args: &A) {
        self.entries.remove(&CacheKey::new(function, args));
    }

    /// Evict every entry produced by `function`.
    pub fn invalidate_function(&self, function: &'static str) {
        self.entries.retain(|key, _| key.function != function);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.entries.retain(|_, entry| now < entry.expires_at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
