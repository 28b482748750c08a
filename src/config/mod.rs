// ABOUTME: Configuration management module for storage backend settings
// ABOUTME: Environment-driven configuration consumed by the storage factory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

//! Configuration module for confman
//!
//! - **Environment**: storage backend, KMS alias, compatibility mode and
//!   parameter store connection overrides read from environment variables

/// Environment-based storage configuration
pub mod environment;

pub use environment::{SsmConnectionConfig, StorageBackend, StorageConfig};
