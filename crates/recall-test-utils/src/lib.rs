// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Recall integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Mock embedding adapter with scripted outcomes
//! - [`StoreHarness`] - Temp-file vector store wired to the chunk embedder

pub mod harness;
pub mod mock_embedder;

pub use harness::{StoreHarness, StoreHarnessBuilder};
pub use mock_embedder::{DEFAULT_MOCK_VECTOR, MockEmbedder, ScriptedEmbedding};
