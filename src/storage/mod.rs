// ABOUTME: Storage abstraction for hierarchical configuration with pluggable backends
// ABOUTME: Remote parameter store, in-memory backend and case-folding compatibility decorator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

/// Case-folding decorator for stores written by older tooling
pub mod chamber;
/// Storage factory for configuration-driven backend selection
pub mod factory;
/// In-memory storage implementation
pub mod memory;
/// AWS Systems Manager Parameter Store backend
pub mod parameter_store;

use crate::context::OperationContext;
use async_trait::async_trait;
use confman_core::errors::{AppError, AppResult};
use confman_core::ServicePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key/value pairs stored under one service path
pub type Config = BTreeMap<String, String>;

/// A stored value together with its backend metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    /// Key within the service path
    pub key: String,
    /// Stored value, empty when the value could not be read
    pub value: String,
    /// Backend metadata, e.g. `version` or `last_modified_user`
    pub metadata: BTreeMap<String, String>,
}

/// Behavior of a batch read when some requested keys do not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadBatchPolicy {
    /// Any missing key fails the whole read with `ConfigNotFound`
    #[default]
    Collapse,
    /// Missing keys are logged and the keys that exist are returned
    Partial,
}

impl ReadBatchPolicy {
    /// Configuration value naming this policy
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Collapse => "collapse",
            Self::Partial => "partial",
        }
    }
}

impl FromStr for ReadBatchPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "collapse" => Ok(Self::Collapse),
            "partial" => Ok(Self::Partial),
            other => Err(AppError::invalid_input(format!(
                "unknown read batch policy '{other}', expected 'collapse' or 'partial'"
            ))),
        }
    }
}

impl fmt::Display for ReadBatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage contract for configuration backends
///
/// Every operation is scoped to one [`ServicePath`] and takes an
/// [`OperationContext`]. Absent keys and paths surface as `ConfigNotFound`.
/// None of the multi-key operations are transactional.
///
/// # Examples
///
/// ```rust,no_run
/// use confman::context::OperationContext;
/// use confman::storage::memory::InMemoryStorage;
/// use confman::storage::Storage;
/// use confman_core::ServicePath;
/// # async fn example() -> Result<(), confman_core::AppError> {
///
/// let storage = InMemoryStorage::new();
/// let ctx = OperationContext::background();
/// let path = ServicePath::format("billing/prod");
///
/// storage.write(&ctx, &path, "DB_HOST", "db.internal").await?;
/// assert_eq!(storage.read(&ctx, &path, "DB_HOST").await?, "db.internal");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Storage: Send + Sync + fmt::Display {
    /// Store `value` under `key`, skipping the write when nothing changes
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write
    async fn write(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        key: &str,
        value: &str,
    ) -> AppResult<()>;

    /// Store every changed entry of `config`, one key at a time
    ///
    /// Stops at the first failure or cancellation. Keys written before the
    /// stop are listed in the error's `applied_keys` detail.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails or the context is cancelled
    async fn write_keys(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        config: &Config,
    ) -> AppResult<()>;

    /// Read a single value
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the key does not exist
    async fn read(&self, ctx: &OperationContext, path: &ServicePath, key: &str)
        -> AppResult<String>;

    /// Read several values
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if any key is absent under the backend's
    /// batch policy, or an error if the backend fails
    async fn read_keys(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        keys: &[String],
    ) -> AppResult<Config>;

    /// Read every key directly under `path` (not recursive)
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the backend reports the path as absent
    async fn read_all(&self, ctx: &OperationContext, path: &ServicePath) -> AppResult<Config>;

    /// Read every key directly under `path` with backend metadata
    ///
    /// # Errors
    ///
    /// Returns an error if either the value or the metadata listing fails
    async fn read_all_metadata(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
    ) -> AppResult<Vec<KeyMetadata>>;

    /// Delete a single key; absent keys are not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn delete(&self, ctx: &OperationContext, path: &ServicePath, key: &str) -> AppResult<()>;

    /// Delete several keys; absent keys are not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn delete_keys(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        keys: &[String],
    ) -> AppResult<()>;

    /// Metadata fields worth displaying next to values
    fn metadata_keys(&self) -> Vec<String>;

    /// The form in which read results present `key`
    fn canonical_key(&self, key: &str) -> String {
        key.to_owned()
    }
}
