// ABOUTME: Core types and constants for confman hierarchical configuration management
// ABOUTME: Foundation crate with error handling, service paths, and backend limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

#![deny(unsafe_code)]

//! # Confman Core
//!
//! Foundation crate providing shared types and constants for confman. This
//! crate is designed to change infrequently, enabling incremental compilation
//! benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode` and `AppResult`
//! - **constants**: Backend limits, metadata field names and environment variable names
//! - **`service_path`**: Formatting and parsing of hierarchical service paths

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Hierarchical service path namespace
pub mod service_path;

pub use errors::{AppError, AppResult, ErrorCode};
pub use service_path::ServicePath;
