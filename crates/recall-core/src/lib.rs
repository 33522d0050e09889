// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Recall memory subsystem.
//!
//! This crate provides the error taxonomy, the embedding adapter traits, and
//! the provider enums shared by configuration and the memory core.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RecallError;
pub use types::{EmbeddingBackend, EmbeddingInput, EmbeddingOutput, HealthStatus, ProviderPreference};

pub use traits::{EmbeddingAdapter, PluginAdapter};
