// ABOUTME: Cancellable, deadline-bearing context threaded through every storage operation
// ABOUTME: Checked cooperatively between remote calls; in-flight calls are never aborted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

use confman_core::errors::{AppError, AppResult};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-operation cancellation and deadline
///
/// Cloning shares the underlying token, so cancelling any clone cancels all
/// of them. Child contexts inherit cancellation from their parent and may
/// carry a tighter deadline.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl OperationContext {
    /// Context that is never cancelled and has no deadline
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Context driven by an existing cancellation token
    #[must_use]
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Context that expires `timeout` from now
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().child_with_timeout(timeout)
    }

    /// Child context sharing this context's cancellation, expiring no later than `timeout` from now
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = self
            .deadline
            .map_or(candidate, |existing| existing.min(candidate));
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token backing this context, e.g. for `select!` against a shutdown signal
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Deadline, if any
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context has been cancelled or its deadline has passed
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Fail if the context has been cancelled or has expired
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` after [`cancel`](Self::cancel) and
    /// `DeadlineExceeded` once the deadline has passed
    pub fn check(&self) -> AppResult<()> {
        if self.token.is_cancelled() {
            return Err(AppError::cancelled());
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(AppError::deadline_exceeded());
        }
        Ok(())
    }
}
