// ABOUTME: Unified error type and error codes shared by every confman storage layer
// ABOUTME: Carries service path, key and partial-progress details alongside the source error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

//! # Unified Error Handling System
//!
//! Every storage backend, the compatibility decorator and the configuration
//! manager report failures through [`AppError`]. Callers match on
//! [`ErrorCode`], never on the human-readable message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout confman
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Storage (1000-1999)
    /// Key, batch or whole service path is absent
    #[serde(rename = "CONFIG_NOT_FOUND")]
    ConfigNotFound = 1000,
    /// A single backend request exceeded the per-request item ceiling
    #[serde(rename = "TOO_MANY_KEYS")]
    TooManyKeys = 1001,

    // External Services (5000-5999)
    /// The remote parameter store or its transport failed
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,

    // Cancellation (7000-7999)
    /// The operation context was cancelled
    #[serde(rename = "CANCELLED")]
    Cancelled = 7000,
    /// The operation context deadline passed
    #[serde(rename = "DEADLINE_EXCEEDED")]
    DeadlineExceeded = 7001,

    // Configuration (6000-6999)
    /// Required configuration is missing
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,
    /// Configuration is present but invalid
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Validation (3000-3999)
    /// Caller supplied invalid input
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ConfigNotFound => "Configuration not found",
            Self::TooManyKeys => "Too many keys in a single backend request",
            Self::ExternalServiceError => "The parameter store reported an error",
            Self::Cancelled => "Operation cancelled",
            Self::DeadlineExceeded => "Operation deadline exceeded",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InvalidInput => "The provided input is invalid",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Service path the failing operation was scoped to
    pub service_path: Option<String>,
    /// Key the failing operation was working on
    pub key: Option<String>,
    /// Additional key-value context, e.g. keys already applied before a failure
    pub details: Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service_path: None,
            key: None,
            details: Value::Object(Map::new()),
        }
    }
}

/// Unified error type for confman
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Attach the service path the operation was scoped to
    #[must_use]
    pub fn with_service_path(mut self, service_path: impl Into<String>) -> Self {
        self.context.service_path = Some(service_path.into());
        self
    }

    /// Attach the key the operation was working on
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.context.key = Some(key.into());
        self
    }

    /// Insert a single detail entry, keeping any details already present
    #[must_use]
    pub fn with_detail(mut self, name: &str, value: impl Into<Value>) -> Self {
        if !self.context.details.is_object() {
            self.context.details = Value::Object(Map::new());
        }
        if let Value::Object(details) = &mut self.context.details {
            details.insert(name.to_owned(), value.into());
        }
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Look up a detail entry by name
    #[must_use]
    pub fn detail(&self, name: &str) -> Option<&Value> {
        self.context.details.get(name)
    }

    /// Whether this error means the requested configuration does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::ConfigNotFound
    }

    /// Whether this error came from a cancelled or expired operation context
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self.code, ErrorCode::Cancelled | ErrorCode::DeadlineExceeded)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience functions for creating common errors
impl AppError {
    /// Configuration not found
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigNotFound, format!("{} not found", what.into()))
    }

    /// A backend request would exceed the per-request item ceiling
    #[must_use]
    pub fn too_many_keys(requested: usize, limit: usize) -> Self {
        Self::new(
            ErrorCode::TooManyKeys,
            format!("{requested} keys requested, backend accepts at most {limit}"),
        )
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Operation context cancelled
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled, "context cancelled")
    }

    /// Operation context deadline exceeded
    #[must_use]
    pub fn deadline_exceeded() -> Self {
        Self::new(ErrorCode::DeadlineExceeded, "context deadline exceeded")
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Required configuration value missing
    pub fn config_missing(name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissing,
            format!("{} must be set", name.into()),
        )
    }

    /// Configuration value present but invalid
    pub fn config_invalid(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigInvalid,
            format!("invalid value '{}' for {}", value.into(), name.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}
