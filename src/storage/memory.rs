// ABOUTME: In-process storage backend for local development and tests
// ABOUTME: Mirrors the remote adapter's not-found, idempotent-write and versioning behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

use super::{Config, KeyMetadata, ReadBatchPolicy, Storage};
use crate::context::OperationContext;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use confman_core::constants::metadata;
use confman_core::errors::{AppError, AppResult};
use confman_core::ServicePath;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    version: i64,
    last_modified: DateTime<Utc>,
}

type Store = BTreeMap<ServicePath, BTreeMap<String, Entry>>;

/// Storage kept in process memory
///
/// Clones share the same underlying map. Nothing is persisted.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<Store>>,
    read_batch_policy: ReadBatchPolicy,
}

impl InMemoryStorage {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the batch read policy
    #[must_use]
    pub fn with_read_batch_policy(mut self, policy: ReadBatchPolicy) -> Self {
        self.read_batch_policy = policy;
        self
    }

    /// Store `value` unless it is already current; returns whether anything changed
    async fn upsert(&self, path: &ServicePath, key: &str, value: &str) -> bool {
        let mut store = self.store.write().await;
        let keys = store.entry(path.clone()).or_default();

        match keys.get_mut(key) {
            Some(entry) if entry.value == value => false,
            Some(entry) => {
                entry.value = value.to_owned();
                entry.version += 1;
                entry.last_modified = Utc::now();
                true
            }
            None => {
                keys.insert(
                    key.to_owned(),
                    Entry {
                        value: value.to_owned(),
                        version: 1,
                        last_modified: Utc::now(),
                    },
                );
                true
            }
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    #[instrument(skip(self, _ctx, value), fields(storage = "memory", service_path = %path))]
    async fn write(
        &self,
        _ctx: &OperationContext,
        path: &ServicePath,
        key: &str,
        value: &str,
    ) -> AppResult<()> {
        if !self.upsert(path, key, value).await {
            debug!(key, "Value unchanged, skipping write");
        }
        Ok(())
    }

    #[instrument(skip(self, ctx, config), fields(storage = "memory", service_path = %path))]
    async fn write_keys(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        config: &Config,
    ) -> AppResult<()> {
        if config.is_empty() {
            warn!("write_keys called with 0 keys");
            return Ok(());
        }

        let mut applied: Vec<String> = Vec::with_capacity(config.len());
        for (key, value) in config {
            if let Err(e) = ctx.check() {
                return Err(e
                    .with_service_path(path.as_str())
                    .with_detail("applied_keys", applied));
            }
            if self.upsert(path, key, value).await {
                applied.push(key.clone());
            }
        }

        debug!(changed = applied.len(), "Wrote keys");
        Ok(())
    }

    #[instrument(skip(self, _ctx), fields(storage = "memory", service_path = %path))]
    async fn read(&self, _ctx: &OperationContext, path: &ServicePath, key: &str) -> AppResult<String> {
        self.store
            .read()
            .await
            .get(path)
            .and_then(|keys| keys.get(key))
            .map(|entry| entry.value.clone())
            .ok_or_else(|| {
                AppError::not_found(format!("key '{key}'"))
                    .with_service_path(path.as_str())
                    .with_key(key)
            })
    }

    #[instrument(skip(self, _ctx, keys), fields(storage = "memory", service_path = %path))]
    async fn read_keys(
        &self,
        _ctx: &OperationContext,
        path: &ServicePath,
        keys: &[String],
    ) -> AppResult<Config> {
        if keys.is_empty() {
            warn!("read_keys called with 0 keys");
            return Ok(Config::new());
        }

        let store = self.store.read().await;
        let stored = store.get(path);

        let mut config = Config::new();
        let mut missing = Vec::new();
        for key in keys {
            match stored.and_then(|entries| entries.get(key)) {
                Some(entry) => {
                    config.insert(key.clone(), entry.value.clone());
                }
                None => missing.push(key.clone()),
            }
        }
        drop(store);

        if missing.is_empty() {
            return Ok(config);
        }
        match self.read_batch_policy {
            ReadBatchPolicy::Collapse => Err(AppError::not_found(format!(
                "{} of {} requested keys",
                missing.len(),
                keys.len()
            ))
            .with_service_path(path.as_str())
            .with_detail("missing_keys", missing)),
            ReadBatchPolicy::Partial => {
                for key in &missing {
                    warn!(key = %key, "Requested key does not exist");
                }
                Ok(config)
            }
        }
    }

    #[instrument(skip(self, _ctx), fields(storage = "memory", service_path = %path))]
    async fn read_all(&self, _ctx: &OperationContext, path: &ServicePath) -> AppResult<Config> {
        Ok(self
            .store
            .read()
            .await
            .get(path)
            .map(|keys| {
                keys.iter()
                    .map(|(key, entry)| (key.clone(), entry.value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    #[instrument(skip(self, _ctx), fields(storage = "memory", service_path = %path))]
    async fn read_all_metadata(
        &self,
        _ctx: &OperationContext,
        path: &ServicePath,
    ) -> AppResult<Vec<KeyMetadata>> {
        let store = self.store.read().await;
        let Some(keys) = store.get(path) else {
            return Ok(Vec::new());
        };

        Ok(keys
            .iter()
            .map(|(key, entry)| KeyMetadata {
                key: key.clone(),
                value: entry.value.clone(),
                metadata: BTreeMap::from([
                    (metadata::VERSION.to_owned(), entry.version.to_string()),
                    (
                        metadata::LAST_MODIFIED_DATE.to_owned(),
                        entry
                            .last_modified
                            .to_rfc3339_opts(SecondsFormat::Secs, true),
                    ),
                    (metadata::LAST_MODIFIED_USER.to_owned(), String::new()),
                ]),
            })
            .collect())
    }

    #[instrument(skip(self, ctx), fields(storage = "memory", service_path = %path))]
    async fn delete(&self, ctx: &OperationContext, path: &ServicePath, key: &str) -> AppResult<()> {
        self.delete_keys(ctx, path, &[key.to_owned()]).await
    }

    #[instrument(skip(self, _ctx, keys), fields(storage = "memory", service_path = %path))]
    async fn delete_keys(
        &self,
        _ctx: &OperationContext,
        path: &ServicePath,
        keys: &[String],
    ) -> AppResult<()> {
        if keys.is_empty() {
            warn!("delete_keys called with 0 keys");
            return Ok(());
        }

        let mut store = self.store.write().await;
        if let Some(entries) = store.get_mut(path) {
            for key in keys {
                if entries.remove(key).is_none() {
                    warn!(key = %key, "Key to delete does not exist");
                }
            }
            if entries.is_empty() {
                store.remove(path);
            }
        }
        Ok(())
    }

    fn metadata_keys(&self) -> Vec<String> {
        metadata::DISPLAY_KEYS
            .iter()
            .map(|key| (*key).to_owned())
            .collect()
    }
}

impl fmt::Display for InMemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InMemoryStorage")
    }
}
