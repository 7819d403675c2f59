// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device secure storage seam.
//!
//! Platform keychains are string key-value stores with get, set and delete.
//! [`MemorySecureStore`] backs tests and headless tools.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
#[error("secure store: {0}")]
pub struct SecureStoreError(pub String);

#[async_trait]
pub trait SecureStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SecureStoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SecureStoreError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), SecureStoreError>;
}

#[derive(Debug, Default)]
pub struct MemorySecureStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SecureStoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SecureStoreError> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SecureStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
