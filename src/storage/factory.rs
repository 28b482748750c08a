// ABOUTME: Storage factory for configuration-driven backend selection
// ABOUTME: Loads AWS SDK config for the parameter store and applies the compatibility decorator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

use super::chamber::ChamberCompatibility;
use super::memory::InMemoryStorage;
use super::parameter_store::aws::SsmParameterClient;
use super::parameter_store::client::ParameterStoreClient;
use super::parameter_store::ParameterStore;
use super::Storage;
use crate::config::environment::{StorageBackend, StorageConfig};
use aws_config::BehaviorVersion;
use confman_core::errors::AppResult;
use std::sync::Arc;
use tracing::info;

/// Create the storage described by `config`
///
/// # Errors
///
/// Returns an error if the configuration is invalid
pub async fn create_storage(config: &StorageConfig) -> AppResult<Arc<dyn Storage>> {
    config.validate()?;

    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::ParameterStore => {
            let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
            info!(
                region = ?sdk_config.region(),
                endpoint = ?config.ssm.endpoint,
                "Initializing parameter store storage"
            );
            let client = SsmParameterClient::new(&sdk_config, &config.ssm);
            Arc::new(parameter_store_with_client(config, Arc::new(client)))
        }
        StorageBackend::Memory => {
            info!("Initializing in-memory storage");
            Arc::new(InMemoryStorage::new().with_read_batch_policy(config.read_batch_policy))
        }
    };

    Ok(apply_compatibility(storage, config.chamber_compatible))
}

/// Create storage from environment variables
///
/// # Errors
///
/// Returns an error if the environment holds invalid configuration
pub async fn create_storage_from_env() -> AppResult<Arc<dyn Storage>> {
    let config = StorageConfig::from_env()?;
    create_storage(&config).await
}

/// Build a parameter store adapter over an existing client using `config`'s settings
#[must_use]
pub fn parameter_store_with_client(
    config: &StorageConfig,
    client: Arc<dyn ParameterStoreClient>,
) -> ParameterStore {
    ParameterStore::new(client, &config.kms_key_alias)
        .with_read_batch_policy(config.read_batch_policy)
}

/// Wrap `storage` in [`ChamberCompatibility`] when `enabled`
#[must_use]
pub fn apply_compatibility(storage: Arc<dyn Storage>, enabled: bool) -> Arc<dyn Storage> {
    if enabled {
        info!(inner = %storage, "Enabling chamber key compatibility");
        Arc::new(ChamberCompatibility::new(storage))
    } else {
        storage
    }
}
