// ABOUTME: Storage implementation over a remote, versioned, per-key encrypted parameter store
// ABOUTME: Batches reads and deletes under the ten-name request limit and pages through path listings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

/// AWS SDK binding for the client contract
pub mod aws;
/// Remote client contract and request/response types
pub mod client;

use self::client::{
    DeleteParametersInput, DescribeParametersInput, GetParametersByPathInput, GetParametersInput,
    ParameterMetadata, ParameterStoreClient, PutParameterInput,
};
use super::{Config, KeyMetadata, ReadBatchPolicy, Storage};
use crate::context::OperationContext;
use async_trait::async_trait;
use chrono::SecondsFormat;
use confman_core::constants::{kms, limits, metadata};
use confman_core::errors::{AppError, AppResult};
use confman_core::ServicePath;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Parameter store backed [`Storage`]
///
/// Values are written as `SecureString` parameters encrypted under a KMS
/// key. Writes read the current value first and skip the put when nothing
/// changes, so unchanged keys keep their version.
#[derive(Clone)]
pub struct ParameterStore {
    client: Arc<dyn ParameterStoreClient>,
    kms_key_id: String,
    read_batch_policy: ReadBatchPolicy,
}

impl ParameterStore {
    /// Create an adapter writing with the given KMS key alias
    ///
    /// The alias gains an `alias/` prefix when it does not already carry one.
    #[must_use]
    pub fn new(client: Arc<dyn ParameterStoreClient>, kms_key_alias: &str) -> Self {
        Self {
            client,
            kms_key_id: normalize_kms_alias(kms_key_alias),
            read_batch_policy: ReadBatchPolicy::default(),
        }
    }

    /// Replace the batch read policy
    #[must_use]
    pub fn with_read_batch_policy(mut self, policy: ReadBatchPolicy) -> Self {
        self.read_batch_policy = policy;
        self
    }

    /// KMS key id used for writes
    #[must_use]
    pub fn kms_key_id(&self) -> &str {
        &self.kms_key_id
    }

    /// Batch read policy in effect
    #[must_use]
    pub const fn read_batch_policy(&self) -> ReadBatchPolicy {
        self.read_batch_policy
    }

    async fn put(&self, path: &ServicePath, key: &str, value: &str) -> AppResult<()> {
        let name = path.parameter_name(key);
        debug!(parameter = %name, "Writing parameter");
        self.client
            .put_parameter(PutParameterInput {
                name,
                value: value.to_owned(),
                key_id: self.kms_key_id.clone(),
                overwrite: true,
                description: String::new(),
            })
            .await
            .map_err(|e| e.with_service_path(path.as_str()).with_key(key))
    }

    /// Put `value` unless it is already current; returns whether a put was issued
    async fn write_if_changed(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        key: &str,
        value: &str,
    ) -> AppResult<bool> {
        let current = match self.read(ctx, path, key).await {
            Ok(current) => Some(current),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        if current.as_deref() == Some(value) {
            debug!(key, "Value unchanged, skipping write");
            return Ok(false);
        }

        self.put(path, key, value).await?;
        Ok(true)
    }

    /// Read one batch of at most ten keys
    async fn read_batch(&self, path: &ServicePath, keys: &[String]) -> AppResult<Config> {
        if keys.len() > limits::MAX_KEYS_PER_REQUEST {
            return Err(AppError::too_many_keys(
                keys.len(),
                limits::MAX_KEYS_PER_REQUEST,
            ));
        }

        debug!(?keys, "Reading parameter batch");
        let output = self
            .client
            .get_parameters(GetParametersInput {
                names: keys.iter().map(|key| path.parameter_name(key)).collect(),
                with_decryption: true,
            })
            .await
            .map_err(|e| e.with_service_path(path.as_str()))?;

        if !output.invalid_parameters.is_empty() {
            match self.read_batch_policy {
                ReadBatchPolicy::Collapse => {
                    return Err(AppError::not_found(format!(
                        "{} of {} requested keys",
                        output.invalid_parameters.len(),
                        keys.len()
                    ))
                    .with_service_path(path.as_str())
                    .with_detail("missing_parameters", output.invalid_parameters));
                }
                ReadBatchPolicy::Partial => {
                    for name in &output.invalid_parameters {
                        warn!(parameter = %name, "Requested parameter does not exist");
                    }
                }
            }
        }

        Ok(output
            .parameters
            .into_iter()
            .map(|parameter| {
                (
                    ServicePath::base_name(&parameter.name).to_owned(),
                    parameter.value,
                )
            })
            .collect())
    }

    async fn delete_batch(&self, path: &ServicePath, keys: &[String]) -> AppResult<()> {
        if keys.len() > limits::MAX_KEYS_PER_REQUEST {
            return Err(AppError::too_many_keys(
                keys.len(),
                limits::MAX_KEYS_PER_REQUEST,
            ));
        }

        debug!(?keys, "Deleting parameter batch");
        let output = self
            .client
            .delete_parameters(DeleteParametersInput {
                names: keys.iter().map(|key| path.parameter_name(key)).collect(),
            })
            .await
            .map_err(|e| e.with_service_path(path.as_str()))?;

        if output.deleted_parameters.len() != keys.len() {
            warn!(
                requested = keys.len(),
                deleted = output.deleted_parameters.len(),
                "Deleted fewer parameters than requested"
            );
        }
        for name in &output.deleted_parameters {
            debug!(parameter = %name, "Deleted parameter");
        }
        // Absent parameters are gone either way
        for name in &output.invalid_parameters {
            warn!(parameter = %name, "Parameter to delete does not exist");
        }

        Ok(())
    }

    /// Page through the one-level metadata listing for `path`
    async fn describe_all(&self, path: &ServicePath) -> AppResult<Vec<ParameterMetadata>> {
        let mut described = Vec::new();
        let mut next_token = None;

        loop {
            let page = self
                .client
                .describe_parameters(DescribeParametersInput {
                    path: path.as_str().to_owned(),
                    next_token,
                })
                .await
                .map_err(|e| e.with_service_path(path.as_str()))?;

            described.extend(page.parameters);
            next_token = page.next_token.filter(|token| !token.is_empty());
            if next_token.is_none() {
                break;
            }
        }

        Ok(described)
    }
}

/// Prefix a KMS alias with `alias/` unless already present
fn normalize_kms_alias(alias: &str) -> String {
    if alias.starts_with(kms::ALIAS_PREFIX) {
        alias.to_owned()
    } else {
        format!("{}{alias}", kms::ALIAS_PREFIX)
    }
}

fn to_key_metadata(described: ParameterMetadata, values: &Config) -> KeyMetadata {
    let key = ServicePath::base_name(&described.name).to_owned();
    let value = values.get(&key).cloned().unwrap_or_default();

    let mut fields = BTreeMap::new();
    fields.insert(
        metadata::DESCRIPTION.to_owned(),
        described.description.unwrap_or_default(),
    );
    fields.insert(metadata::VERSION.to_owned(), described.version.to_string());
    fields.insert(
        metadata::PARAMETER_TYPE.to_owned(),
        described.parameter_type.unwrap_or_default(),
    );
    fields.insert(
        metadata::LAST_MODIFIED_DATE.to_owned(),
        described
            .last_modified_date
            .map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default(),
    );
    fields.insert(
        metadata::LAST_MODIFIED_USER.to_owned(),
        described.last_modified_user.unwrap_or_default(),
    );
    fields.insert(
        metadata::TIER.to_owned(),
        described.tier.unwrap_or_default(),
    );

    KeyMetadata {
        key,
        value,
        metadata: fields,
    }
}

#[async_trait]
impl Storage for ParameterStore {
    #[instrument(skip(self, ctx, value), fields(storage = "parameter_store", service_path = %path))]
    async fn write(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
        key: &str,
        value: &str,
    ) -> AppResult<()> {
        self.write_if_changed(ctx, path, key, value).await.map(|_| ())
    }

    #[instrument(skip(self, ctx, config), fields(storage = "parameter_store", service_path = %path))]
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

        let keys: Vec<String> = config.keys().cloned().collect();
        let current = match self.read_keys(ctx, path, &keys).await {
            Ok(current) => current,
            Err(e) if e.is_not_found() => Config::new(),
            Err(e) => return Err(e),
        };

        let changed: Vec<(&String, &String)> = config
            .iter()
            .filter(|(key, value)| current.get(*key) != Some(*value))
            .collect();
        debug!(
            requested = config.len(),
            changed = changed.len(),
            "Writing changed keys"
        );

        let mut applied: Vec<String> = Vec::with_capacity(changed.len());
        for (key, value) in changed {
            let result = match ctx.check() {
                Ok(()) => self.write_if_changed(ctx, path, key, value).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(true) => applied.push(key.clone()),
                Ok(false) => {}
                Err(e) => {
                    return Err(e
                        .with_service_path(path.as_str())
                        .with_detail("applied_keys", applied));
                }
            }
        }

        Ok(())
    }

    #[instrument(skip(self, ctx), fields(storage = "parameter_store", service_path = %path))]
    async fn read(&self, ctx: &OperationContext, path: &ServicePath, key: &str) -> AppResult<String> {
        let mut config = self.read_keys(ctx, path, &[key.to_owned()]).await?;
        config.remove(key).ok_or_else(|| {
            AppError::not_found(format!("key '{key}'"))
                .with_service_path(path.as_str())
                .with_key(key)
        })
    }

    #[instrument(skip(self, _ctx, keys), fields(storage = "parameter_store", service_path = %path, count = keys.len()))]
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

        let mut config = Config::new();
        for batch in keys.chunks(limits::MAX_KEYS_PER_REQUEST) {
            config.extend(self.read_batch(path, batch).await?);
        }

        debug!(read = config.len(), "Read keys");
        Ok(config)
    }

    #[instrument(skip(self, _ctx), fields(storage = "parameter_store", service_path = %path))]
    async fn read_all(&self, _ctx: &OperationContext, path: &ServicePath) -> AppResult<Config> {
        let mut config = Config::new();
        let mut next_token = None;

        loop {
            let page = self
                .client
                .get_parameters_by_path(GetParametersByPathInput {
                    path: path.as_str().to_owned(),
                    recursive: false,
                    with_decryption: true,
                    max_results: limits::PAGE_SIZE,
                    next_token,
                })
                .await
                .map_err(|e| e.with_service_path(path.as_str()))?;

            for parameter in page.parameters {
                config.insert(
                    ServicePath::base_name(&parameter.name).to_owned(),
                    parameter.value,
                );
            }

            next_token = page.next_token.filter(|token| !token.is_empty());
            if next_token.is_none() {
                break;
            }
        }

        debug!(read = config.len(), "Read all keys");
        Ok(config)
    }

    /// Values and metadata come from two separate listings, so a key
    /// written between them can appear with an empty or stale value.
    #[instrument(skip(self, ctx), fields(storage = "parameter_store", service_path = %path))]
    async fn read_all_metadata(
        &self,
        ctx: &OperationContext,
        path: &ServicePath,
    ) -> AppResult<Vec<KeyMetadata>> {
        let values = self.read_all(ctx, path).await?;
        let described = self.describe_all(path).await?;

        Ok(described
            .into_iter()
            .map(|parameter| to_key_metadata(parameter, &values))
            .collect())
    }

    #[instrument(skip(self, _ctx), fields(storage = "parameter_store", service_path = %path))]
    async fn delete(&self, _ctx: &OperationContext, path: &ServicePath, key: &str) -> AppResult<()> {
        self.delete_batch(path, &[key.to_owned()]).await
    }

    #[instrument(skip(self, _ctx, keys), fields(storage = "parameter_store", service_path = %path, count = keys.len()))]
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

        for batch in keys.chunks(limits::MAX_KEYS_PER_REQUEST) {
            self.delete_batch(path, batch).await?;
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

impl fmt::Display for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParameterStore")
    }
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("kms_key_id", &self.kms_key_id)
            .field("read_batch_policy", &self.read_batch_policy)
            .finish_non_exhaustive()
    }
}
