// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules.
//!
//! Query functions take a `&Database` and run through its single writer
//! connection via `conn.call()`.

pub mod vectors;
