// ABOUTME: Environment configuration for storage backend selection and parameter store connection
// ABOUTME: Parses CONFMAN_* and AWS_REGION variables into strongly typed settings with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

//! Environment-based configuration for confman storage

use crate::storage::ReadBatchPolicy;
use confman_core::constants::{env_config, kms};
use confman_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Storage backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    /// AWS Systems Manager Parameter Store
    #[default]
    ParameterStore,
    /// Process-local map, for development and tests
    Memory,
}

impl StorageBackend {
    /// Configuration value naming this backend
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ParameterStore => "parameter-store",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "parameter-store" | "parameter_store" | "ssm" => Ok(Self::ParameterStore),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::config_invalid(env_config::STORAGE_BACKEND, other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection overrides for the parameter store client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsmConnectionConfig {
    /// Region override; the SDK default chain applies when unset
    pub region: Option<String>,
    /// Endpoint override, e.g. a LocalStack URL
    pub endpoint: Option<String>,
    /// Per-operation timeout
    pub operation_timeout: Option<Duration>,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Backend to construct
    pub backend: StorageBackend,
    /// KMS key alias used to encrypt written values
    pub kms_key_alias: String,
    /// Wrap the backend in the case-folding compatibility layer
    pub chamber_compatible: bool,
    /// Behavior of batch reads that hit missing keys
    pub read_batch_policy: ReadBatchPolicy,
    /// Parameter store connection overrides
    pub ssm: SsmConnectionConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            kms_key_alias: kms::DEFAULT_KEY_ALIAS.to_owned(),
            chamber_compatible: false,
            read_batch_policy: ReadBatchPolicy::default(),
            ssm: SsmConnectionConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or empty variables fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if a variable holds an unparseable value and
    /// `ConfigMissing` if the KMS key alias is set to an empty string
    pub fn from_env() -> AppResult<Self> {
        info!("Loading storage configuration from environment variables");

        let backend = env_non_empty(env_config::STORAGE_BACKEND)
            .map(|value| value.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or_default();

        let kms_key_alias = match env::var(env_config::KMS_KEY_ALIAS) {
            Ok(value) => value.trim().to_owned(),
            Err(_) => kms::DEFAULT_KEY_ALIAS.to_owned(),
        };

        let chamber_compatible = env_non_empty(env_config::CHAMBER_COMPATIBLE)
            .map(|value| parse_bool(env_config::CHAMBER_COMPATIBLE, &value))
            .transpose()?
            .unwrap_or(false);

        let read_batch_policy = env_non_empty(env_config::READ_BATCH_POLICY)
            .map(|value| {
                value.parse::<ReadBatchPolicy>().map_err(|_| {
                    AppError::config_invalid(env_config::READ_BATCH_POLICY, value.as_str())
                })
            })
            .transpose()?
            .unwrap_or_default();

        let operation_timeout = env_non_empty(env_config::SSM_TIMEOUT_MS)
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| AppError::config_invalid(env_config::SSM_TIMEOUT_MS, value.as_str()))
            })
            .transpose()?;

        let config = Self {
            backend,
            kms_key_alias,
            chamber_compatible,
            read_batch_policy,
            ssm: SsmConnectionConfig {
                region: env_non_empty(env_config::AWS_REGION),
                endpoint: env_non_empty(env_config::SSM_ENDPOINT),
                operation_timeout,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` if the parameter store backend has no KMS key
    /// alias and `ConfigInvalid` if the operation timeout is zero
    pub fn validate(&self) -> AppResult<()> {
        if self.backend == StorageBackend::ParameterStore && self.kms_key_alias.is_empty() {
            return Err(AppError::config_missing(env_config::KMS_KEY_ALIAS));
        }
        if self.ssm.operation_timeout == Some(Duration::ZERO) {
            return Err(AppError::config(format!(
                "{} must be greater than zero",
                env_config::SSM_TIMEOUT_MS
            )));
        }
        Ok(())
    }

    /// Human-readable configuration summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Confman Storage Configuration:\n\
             - Backend: {}\n\
             - KMS Key Alias: {}\n\
             - Chamber Compatible: {}\n\
             - Read Batch Policy: {}\n\
             - Region: {}\n\
             - Endpoint: {}\n\
             - Operation Timeout: {}",
            self.backend,
            self.kms_key_alias,
            if self.chamber_compatible {
                "Enabled"
            } else {
                "Disabled"
            },
            self.read_batch_policy,
            self.ssm.region.as_deref().unwrap_or("SDK default"),
            self.ssm.endpoint.as_deref().unwrap_or("SDK default"),
            self.ssm
                .operation_timeout
                .map_or_else(|| "None".to_owned(), |t| format!("{}ms", t.as_millis())),
        )
    }
}

/// Read an environment variable, treating empty values as unset
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::config_invalid(key, value)),
    }
}
