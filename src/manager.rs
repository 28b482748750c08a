// ABOUTME: Service-path bound configuration manager composing storage primitives
// ABOUTME: Provides copy, move and declarative define across service paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

//! # Configuration Manager
//!
//! [`ConfigManager`] binds a [`Storage`] to one [`ServicePath`] and adds the
//! cross-path operations built from storage primitives:
//!
//! - **copy**: read everything under this path and write it under another
//! - **move**: copy, then delete the copied keys from this path
//! - **define**: make this path hold exactly the given keys
//!
//! None of these are atomic. A failure part way leaves earlier steps
//! applied; the returned error's `phase` detail says which step failed.

use crate::context::OperationContext;
use crate::logging::log_storage_operation;
use crate::storage::{Config, KeyMetadata, Storage};
use confman_core::errors::{AppError, AppResult};
use confman_core::ServicePath;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Storage bound to a single service path
#[derive(Clone)]
pub struct ConfigManager {
    storage: Arc<dyn Storage>,
    service_path: ServicePath,
}

impl ConfigManager {
    /// Bind `storage` to `service_path`, formatting the path
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, service_path: impl Into<ServicePath>) -> Self {
        Self {
            storage,
            service_path: service_path.into(),
        }
    }

    /// The formatted service path
    #[must_use]
    pub const fn service_path(&self) -> &ServicePath {
        &self.service_path
    }

    /// The underlying storage
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Full remote name of `key` under this service path
    #[must_use]
    pub fn format_key_path(&self, key: &str) -> String {
        self.service_path.parameter_name(key)
    }

    /// Metadata fields worth displaying next to values
    #[must_use]
    pub fn metadata_keys(&self) -> Vec<String> {
        self.storage.metadata_keys()
    }

    /// Write one key
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects the write
    pub async fn write(&self, ctx: &OperationContext, key: &str, value: &str) -> AppResult<()> {
        self.storage.write(ctx, &self.service_path, key, value).await
    }

    /// Write every changed key of `config`
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails or the context is cancelled
    pub async fn write_keys(&self, ctx: &OperationContext, config: &Config) -> AppResult<()> {
        self.storage
            .write_keys(ctx, &self.service_path, config)
            .await
    }

    /// Read one key
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the key does not exist
    pub async fn read(&self, ctx: &OperationContext, key: &str) -> AppResult<String> {
        self.storage.read(ctx, &self.service_path, key).await
    }

    /// Read several keys
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if keys are missing under the storage's batch policy
    pub async fn read_keys(&self, ctx: &OperationContext, keys: &[String]) -> AppResult<Config> {
        self.storage.read_keys(ctx, &self.service_path, keys).await
    }

    /// Read every key under the service path
    ///
    /// # Errors
    ///
    /// Returns an error if the storage fails
    pub async fn read_all(&self, ctx: &OperationContext) -> AppResult<Config> {
        self.storage.read_all(ctx, &self.service_path).await
    }

    /// Read every key under the service path with metadata
    ///
    /// # Errors
    ///
    /// Returns an error if the storage fails
    pub async fn read_all_metadata(&self, ctx: &OperationContext) -> AppResult<Vec<KeyMetadata>> {
        self.storage.read_all_metadata(ctx, &self.service_path).await
    }

    /// Delete one key
    ///
    /// # Errors
    ///
    /// Returns an error if the storage fails
    pub async fn delete(&self, ctx: &OperationContext, key: &str) -> AppResult<()> {
        self.storage.delete(ctx, &self.service_path, key).await
    }

    /// Delete several keys
    ///
    /// # Errors
    ///
    /// Returns an error if the storage fails
    pub async fn delete_keys(&self, ctx: &OperationContext, keys: &[String]) -> AppResult<()> {
        self.storage
            .delete_keys(ctx, &self.service_path, keys)
            .await
    }

    /// Delete every key under the service path
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deleting fails
    #[instrument(skip(self, ctx), fields(service_path = %self.service_path))]
    pub async fn delete_all(&self, ctx: &OperationContext) -> AppResult<()> {
        let keys: Vec<String> = self.read_all(ctx).await?.into_keys().collect();
        if keys.is_empty() {
            debug!("Nothing to delete");
            return Ok(());
        }
        self.delete_keys(ctx, &keys).await
    }

    /// Copy every key under this path to `dst`
    ///
    /// Copying an empty path succeeds with a warning.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled`/`DeadlineExceeded` if the context ends before the
    /// read or the write, or the storage error that stopped the copy
    #[instrument(skip(self, ctx, dst), fields(src = %self.service_path, dst = %dst.service_path))]
    pub async fn copy(&self, ctx: &OperationContext, dst: &Self) -> AppResult<()> {
        let started = Instant::now();
        let result = self.copy_config(ctx, dst).await;
        self.record("copy", &result, started);
        result.map(|_| ())
    }

    /// Move every key under this path to `dst`
    ///
    /// Keys are deleted from this path only after all of them were written to
    /// `dst`. If the delete step fails the keys exist in both places.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `dst` is this same service path, the copy
    /// error, or a delete error whose details carry `phase = "delete"` and
    /// the `copied_keys`
    #[instrument(skip(self, ctx, dst), fields(src = %self.service_path, dst = %dst.service_path))]
    pub async fn move_to(&self, ctx: &OperationContext, dst: &Self) -> AppResult<()> {
        let started = Instant::now();
        let result = self.move_config(ctx, dst).await;
        self.record("move", &result, started);
        result
    }

    /// Make this path hold exactly `config`
    ///
    /// Keys in `config` are written (unchanged values are skipped), then keys
    /// currently stored but absent from `config` are deleted. Keys are
    /// compared in the storage's canonical form.
    ///
    /// # Errors
    ///
    /// Returns an error whose details carry `phase` (`"read"`, `"write"` or
    /// `"delete"`) and the `stale_keys` scheduled for deletion
    #[instrument(skip(self, ctx, config), fields(service_path = %self.service_path, keys = config.len()))]
    pub async fn define(&self, ctx: &OperationContext, config: &Config) -> AppResult<()> {
        let started = Instant::now();
        let result = self.define_config(ctx, config).await;
        self.record("define", &result, started);
        result
    }

    async fn copy_config(&self, ctx: &OperationContext, dst: &Self) -> AppResult<Config> {
        debug!(src = %self, dst = %dst, "Attempting to copy");

        ctx.check()?;
        let config = self.read_all(ctx).await?;
        if config.is_empty() {
            warn!(service_path = %self.service_path, "No keys copied");
        }

        ctx.check()?;
        if !config.is_empty() {
            dst.write_keys(ctx, &config).await?;
        }

        Ok(config)
    }

    async fn move_config(&self, ctx: &OperationContext, dst: &Self) -> AppResult<()> {
        if dst.service_path == self.service_path {
            return Err(AppError::invalid_input(format!(
                "cannot move '{}' onto itself",
                self.service_path
            ))
            .with_service_path(self.service_path.as_str())
            .with_detail("phase", "copy"));
        }

        let copied = self
            .copy_config(ctx, dst)
            .await
            .map_err(|e| e.with_detail("phase", "copy"))?;
        if copied.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = copied.into_keys().collect();
        self.delete_keys(ctx, &keys).await.map_err(|e| {
            e.with_service_path(self.service_path.as_str())
                .with_detail("phase", "delete")
                .with_detail("copied_keys", keys.clone())
        })
    }

    async fn define_config(&self, ctx: &OperationContext, config: &Config) -> AppResult<()> {
        let current = match self.read_all(ctx).await {
            Ok(current) => current,
            Err(e) if e.is_not_found() => Config::new(),
            Err(e) => return Err(e.with_detail("phase", "read")),
        };

        let wanted: HashSet<String> = config
            .keys()
            .map(|key| self.storage.canonical_key(key))
            .collect();
        let stale: Vec<String> = current
            .into_keys()
            .filter(|key| !wanted.contains(&self.storage.canonical_key(key)))
            .collect();

        debug!(
            keys = ?config.keys().collect::<Vec<_>>(),
            stale = ?stale,
            "Defining keys"
        );

        let phase_error = |e: AppError, phase: &str| {
            e.with_service_path(self.service_path.as_str())
                .with_detail("phase", phase)
                .with_detail("stale_keys", stale.clone())
        };

        if !config.is_empty() {
            self.write_keys(ctx, config)
                .await
                .map_err(|e| phase_error(e, "write"))?;
        }
        if !stale.is_empty() {
            self.delete_keys(ctx, &stale)
                .await
                .map_err(|e| phase_error(e, "delete"))?;
        }

        Ok(())
    }

    fn record<T>(&self, operation: &str, result: &AppResult<T>, started: Instant) {
        log_storage_operation(
            operation,
            self.service_path.as_str(),
            &self.storage.to_string(),
            result.is_ok(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
    }
}

impl fmt::Display for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigManager(service='{}', storage='{}')",
            self.service_path, self.storage
        )
    }
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
