// ABOUTME: Constants for confman organized by domain
// ABOUTME: Backend request limits, KMS defaults, metadata field names and environment variable names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! flat list.

/// Hard limits imposed by the remote parameter store
pub mod limits {
    /// Maximum number of parameter names accepted by a single get/delete request
    pub const MAX_KEYS_PER_REQUEST: usize = 10;
    /// Page size used when enumerating parameters under a path
    pub const PAGE_SIZE: i32 = 10;
}

/// KMS key alias handling
pub mod kms {
    /// Prefix every KMS alias must carry
    pub const ALIAS_PREFIX: &str = "alias/";
    /// Default alias used when none is configured
    pub const DEFAULT_KEY_ALIAS: &str = "parameter_store_key";
}

/// Remote parameter representation
pub mod parameters {
    /// Parameter type used for every write
    pub const SECURE_STRING: &str = "SecureString";
    /// Error code the remote store reports for absent parameters or paths
    pub const NOT_FOUND_CODE: &str = "ParameterNotFound";
    /// Describe filter key restricting results to a path
    pub const PATH_FILTER_KEY: &str = "Path";
    /// Describe filter option restricting results to one path level
    pub const ONE_LEVEL_OPTION: &str = "OneLevel";
}

/// Names of metadata fields surfaced alongside values
pub mod metadata {
    /// Free text description
    pub const DESCRIPTION: &str = "description";
    /// Monotonic version number assigned on each change
    pub const VERSION: &str = "version";
    /// Parameter type, e.g. `SecureString`
    pub const PARAMETER_TYPE: &str = "parameter_type";
    /// RFC 3339 timestamp of the last change
    pub const LAST_MODIFIED_DATE: &str = "last_modified_date";
    /// Identity that made the last change
    pub const LAST_MODIFIED_USER: &str = "last_modified_user";
    /// Storage tier
    pub const TIER: &str = "tier";

    /// Fields every backend lists as its displayable metadata keys
    pub const DISPLAY_KEYS: [&str; 3] = [VERSION, LAST_MODIFIED_DATE, LAST_MODIFIED_USER];
}

/// Environment variable names read by the configuration layer
pub mod env_config {
    /// Storage backend selector
    pub const STORAGE_BACKEND: &str = "CONFMAN_STORAGE_BACKEND";
    /// KMS key alias used for writes
    pub const KMS_KEY_ALIAS: &str = "CONFMAN_KMS_KEY_ALIAS";
    /// Enables the case-folding compatibility layer
    pub const CHAMBER_COMPATIBLE: &str = "CONFMAN_CHAMBER_COMPATIBLE";
    /// Behavior of batch reads that hit missing keys
    pub const READ_BATCH_POLICY: &str = "CONFMAN_READ_BATCH_POLICY";
    /// AWS region override
    pub const AWS_REGION: &str = "AWS_REGION";
    /// Endpoint override for the parameter store, e.g. a local emulator
    pub const SSM_ENDPOINT: &str = "CONFMAN_SSM_ENDPOINT";
    /// Per-operation timeout in milliseconds
    pub const SSM_TIMEOUT_MS: &str = "CONFMAN_SSM_TIMEOUT_MS";
}

/// Service names for structured logging
pub mod service_names {
    /// Default service name
    pub const CONFMAN: &str = "confman";
}
