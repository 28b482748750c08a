// ABOUTME: Decorator folding key case for stores shared with chamber-style tooling
// ABOUTME: Lower-cases keys on the way in and upper-cases keys in read results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

use super::{Config, KeyMetadata, Storage};
use crate::context::OperationContext;
use async_trait::async_trait;
use confman_core::errors::AppResult;
use confman_core::ServicePath;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Case-folding wrapper around any [`Storage`]
///
/// Chamber stores every key lower-case and presents it upper-case. Keys
/// that differ only by case therefore collapse onto one stored key; when a
/// read result contains several of them the later one wins and a warning
/// is logged.
#[derive(Clone)]
pub struct ChamberCompatibility {
    inner: Arc<dyn Storage>,
}

impl ChamberCompatibility {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self { inner }
    }
}

fn to_lower(key: &str) -> String {
    let folded = key.to_lowercase();
    if folded != key {
        debug!(from = key, to = %folded, "Translating key");
    }
    folded
}

fn to_upper(key: &str) -> String {
    let folded = key.to_uppercase();
    if folded != key {
        debug!(from = key, to = %folded, "Translating key");
    }
    folded
}

fn keys_to_lower(keys: &[String]) -> Vec<String> {
    keys.iter().map(|key| to_lower(key)).collect()
}

fn config_to_lower(config: &Config) -> Config {
    let mut folded = Config::new();
    for (key, value) in config {
        if folded.insert(to_lower(key), value.clone()).is_some() {
            warn!(key = %key, "Overwriting key; multiple instances of same key with different case");
        }
    }
    folded
}

fn config_to_upper(config: Config) -> Config {
    let mut folded = Config::new();
    for (key, value) in config {
        let upper = to_upper(&key);
        if folded.insert(upper, value).is_some() {
            warn!(key = %key, "Overwriting key; multiple instances of same key with different case");
        }
    }
    folded
}

/// Upper-case metadata keys; a later duplicate replaces the earlier entry in place
fn metadata_to_upper(entries: Vec<KeyMetadata>) -> Vec<KeyMetadata> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    let mut folded: Vec<KeyMetadata> = Vec::with_capacity(entries.len());

    for mut entry in entries {
        entry.key = to_upper(&entry.key);
        if let Some(&position) = positions.get(&entry.key) {
            warn!(key = %entry.key, "Overwriting key; multiple instances of same key with different case");
            folded[position] = entry;
        } else {
            positions.insert(entry.key.clone(), folded.len());
            folded.push(entry);
        }
    }

    folded
}

#[async_trait]
impl Storage for ChamberCompatibility {
    #[instrument(skip(self, ctx, value), fields(storage = "chamber", service_path = %path))]
    async fn write(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        key: &str,
        value: &str,
    ) -> AppResult<()> {
        self.inner.write(ctx, path, &to_lower(key), value).await
    }

    #[instrument(skip(self, ctx, config), fields(storage = "chamber", service_path = %path))]
    async fn write_keys(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        config: &Config,
    ) -> AppResult<()> {
        self.inner
            .write_keys(ctx, path, &config_to_lower(config))
            .await
    }

    #[instrument(skip(self, ctx), fields(storage = "chamber", service_path = %path))]
    async fn read(&self, ctx: &OperationContext, path: &ServicePath, key: &str) -> AppResult<String> {
        self.inner.read(ctx, path, &to_lower(key)).await
    }

    #[instrument(skip(self, ctx, keys), fields(storage = "chamber", service_path = %path))]
    async fn read_keys(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        keys: &[String],
    ) -> AppResult<Config> {
        let config = self.inner.read_keys(ctx, path, &keys_to_lower(keys)).await?;
        Ok(config_to_upper(config))
    }

    #[instrument(skip(self, ctx), fields(storage = "chamber", service_path = %path))]
    async fn read_all(&self, ctx: &OperationContext, path: &ServicePath) -> AppResult<Config> {
        let config = self.inner.read_all(ctx, path).await?;
        Ok(config_to_upper(config))
    }

    #[instrument(skip(self, ctx), fields(storage = "chamber", service_path = %path))]
    async fn read_all_metadata(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
    ) -> AppResult<Vec<KeyMetadata>> {
        let entries = self.inner.read_all_metadata(ctx, path).await?;
        Ok(metadata_to_upper(entries))
    }

    #[instrument(skip(self, ctx), fields(storage = "chamber", service_path = %path))]
    async fn delete(&self, ctx: &OperationContext, path: &ServicePath, key: &str) -> AppResult<()> {
        self.inner.delete(ctx, path, &to_lower(key)).await
    }

    #[instrument(skip(self, ctx, keys), fields(storage = "chamber", service_path = %path))]
    async fn delete_keys(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        keys: &[String],
    ) -> AppResult<()> {
        self.inner
            .delete_keys(ctx, path, &keys_to_lower(keys))
            .await
    }

    fn metadata_keys(&self) -> Vec<String> {
        self.inner.metadata_keys()
    }

    fn canonical_key(&self, key: &str) -> String {
        key.to_uppercase()
    }
}

impl fmt::Display for ChamberCompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChamberCompatibility({})", self.inner)
    }
}
