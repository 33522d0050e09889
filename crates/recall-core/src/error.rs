// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Recall memory subsystem.

use thiserror::Error;

/// The primary error type used across Recall adapters and core operations.
///
/// Nothing in the retrieval core treats these as fatal: per-chunk and
/// per-candidate failures are isolated, and storage failures are surfaced to
/// the caller without internal retry.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Configuration that cannot be loaded or rendered.
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable storage errors (database open, query failure, transaction abort).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Empty text, empty vector, or a vector that cannot be normalized.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The embedding endpoint answered with a non-success HTTP status.
    #[error("embedding provider returned HTTP {status}: {message}")]
    ProviderHttp { status: u16, message: String },

    /// The embedding endpoint answered, but no vector could be extracted.
    #[error("embedding provider returned no vector: {0}")]
    ProviderEmpty(String),

    /// Transport-level embedding provider failure (connect, decode, client build).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation was cancelled through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// A bounded wait (such as a provider probe) ran out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RecallError {
    /// Returns true for failures of the embedding provider path.
    ///
    /// Callers recover from these by falling back to a lexical vector or by
    /// marking a candidate's vector score as absent.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            RecallError::ProviderHttp { .. }
                | RecallError::ProviderEmpty(_)
                | RecallError::Provider { .. }
                | RecallError::Cancelled
                | RecallError::Timeout { .. }
        )
    }

    /// Returns the HTTP status carried by a [`RecallError::ProviderHttp`].
    pub fn http_status(&self) -> Option<u16> {
        match self {
            RecallError::ProviderHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}
