// ABOUTME: Error types re-exported from entitlements-core for crate-wide use
// ABOUTME: Keeps `crate::errors::AppError` stable for store and config code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

pub use entitlements_core::errors::{AppError, AppResult, ErrorCode};
