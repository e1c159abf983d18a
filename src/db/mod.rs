// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer (key-value JSON documents).

pub mod kv;
pub mod persistence;

pub use kv::{KvStore, StorageError};
pub use persistence::{DebouncedWriter, PersistedState};

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Storage key names as constants.
pub mod keys {
    pub const RUNS: &str = "runs";
    pub const SHOES: &str = "shoes";
    pub const SHOE_USAGE: &str = "shoe_usage";
    pub const SETTINGS: &str = "settings";
    pub const SCHEMA_VERSION: &str = "schema_version";
}

/// Full storage key, `{namespace}:{key}`.
pub fn namespaced(namespace: &str, key: &str) -> String {
    format!("{}:{}", namespace, key)
}
