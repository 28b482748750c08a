// ABOUTME: Contract for the remote parameter store API and its request/response types
// ABOUTME: Lets the adapter run against the AWS SDK or an in-process fake
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use confman_core::errors::AppResult;

/// Create or overwrite one encrypted parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutParameterInput {
    /// Full parameter name
    pub name: String,
    /// Plain-text value, encrypted by the store
    pub value: String,
    /// KMS key used for encryption
    pub key_id: String,
    /// Replace an existing parameter
    pub overwrite: bool,
    /// Free text description
    pub description: String,
}

/// Fetch up to ten parameters by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetParametersInput {
    /// Full parameter names
    pub names: Vec<String>,
    /// Return decrypted values
    pub with_decryption: bool,
}

/// A parameter name and its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Full parameter name
    pub name: String,
    /// Value, decrypted when requested
    pub value: String,
}

/// Parameters found and names that do not exist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetParametersOutput {
    /// Parameters that exist
    pub parameters: Vec<Parameter>,
    /// Requested names that do not exist
    pub invalid_parameters: Vec<String>,
}

/// Fetch one page of parameters under a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetParametersByPathInput {
    /// Path prefix
    pub path: String,
    /// Include nested paths
    pub recursive: bool,
    /// Return decrypted values
    pub with_decryption: bool,
    /// Page size, at most ten
    pub max_results: i32,
    /// Token from the previous page
    pub next_token: Option<String>,
}

/// One page of parameters under a path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetParametersByPathOutput {
    /// Parameters on this page
    pub parameters: Vec<Parameter>,
    /// Token for the next page; `None` or empty when exhausted
    pub next_token: Option<String>,
}

/// Describe one page of parameters directly under a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeParametersInput {
    /// Path the one-level filter applies to
    pub path: String,
    /// Token from the previous page
    pub next_token: Option<String>,
}

/// Metadata the store keeps for each parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMetadata {
    /// Full parameter name
    pub name: String,
    /// Free text description
    pub description: Option<String>,
    /// Version, incremented on each change
    pub version: i64,
    /// Parameter type, e.g. `SecureString`
    pub parameter_type: Option<String>,
    /// Time of the last change
    pub last_modified_date: Option<DateTime<Utc>>,
    /// Identity that made the last change
    pub last_modified_user: Option<String>,
    /// Storage tier
    pub tier: Option<String>,
}

/// One page of parameter metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeParametersOutput {
    /// Metadata on this page
    pub parameters: Vec<ParameterMetadata>,
    /// Token for the next page; `None` or empty when exhausted
    pub next_token: Option<String>,
}

/// Delete up to ten parameters by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteParametersInput {
    /// Full parameter names
    pub names: Vec<String>,
}

/// Names deleted and names that did not exist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteParametersOutput {
    /// Names that were deleted
    pub deleted_parameters: Vec<String>,
    /// Names that did not exist
    pub invalid_parameters: Vec<String>,
}

/// Remote parameter store operations used by [`ParameterStore`](super::ParameterStore)
///
/// Implementations map "parameter not found" responses to `ConfigNotFound`
/// and every other failure to `ExternalServiceError`.
#[async_trait]
pub trait ParameterStoreClient: Send + Sync {
    /// Create or overwrite a parameter
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write
    async fn put_parameter(&self, input: PutParameterInput) -> AppResult<()>;

    /// Fetch parameters by name
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; absent names are reported in the output
    async fn get_parameters(&self, input: GetParametersInput) -> AppResult<GetParametersOutput>;

    /// Fetch one page of parameters under a path
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the store reports the path as absent
    async fn get_parameters_by_path(
        &self,
        input: GetParametersByPathInput,
    ) -> AppResult<GetParametersByPathOutput>;

    /// Describe one page of parameters directly under a path
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    async fn describe_parameters(
        &self,
        input: DescribeParametersInput,
    ) -> AppResult<DescribeParametersOutput>;

    /// Delete parameters by name
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; absent names are reported in the output
    async fn delete_parameters(
        &self,
        input: DeleteParametersInput,
    ) -> AppResult<DeleteParametersOutput>;
}
