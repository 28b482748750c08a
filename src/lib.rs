// ABOUTME: Main library entry point for confman hierarchical configuration management
// ABOUTME: Storage backends, case compatibility, and cross-path copy/move/define operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

#![deny(unsafe_code)]

//! # Confman
//!
//! Manages configuration and secrets grouped under hierarchical service
//! paths (`/billing/prod`) in AWS Systems Manager Parameter Store. Every
//! value is stored as an encrypted `SecureString` parameter.
//!
//! ## Architecture
//!
//! - **Storage**: the [`storage::Storage`] contract and its backends (remote
//!   parameter store, in-memory) plus a case-folding compatibility decorator
//! - **Manager**: [`manager::ConfigManager`] binds storage to one service path
//!   and implements copy, move and declarative define
//! - **Context**: [`context::OperationContext`] carries cancellation and deadlines
//! - **Config**: environment-driven backend selection
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use confman::config::environment::StorageConfig;
//! use confman::context::OperationContext;
//! use confman::manager::ConfigManager;
//! use confman::storage::factory::create_storage;
//! use confman_core::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = StorageConfig::from_env()?;
//!     let storage = create_storage(&config).await?;
//!
//!     let ctx = OperationContext::background();
//!     let dev = ConfigManager::new(storage.clone(), "billing/dev");
//!     let prod = ConfigManager::new(storage, "billing/prod");
//!     dev.copy(&ctx, &prod).await?;
//!
//!     Ok(())
//! }
//! ```

/// Environment configuration for storage selection
pub mod config;

/// Cancellation and deadline context for storage operations
pub mod context;

/// Logging setup and structured operation logging
pub mod logging;

/// Service-path bound configuration manager
pub mod manager;

/// Storage contract and backends
pub mod storage;

pub use confman_core::{constants, errors, AppError, AppResult, ErrorCode, ServicePath};
