// ABOUTME: Configuration module for server and token issuer settings
// ABOUTME: Environment-only configuration, overridable from the command line
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration module
//!
//! - **environment**: `ServerConfig` loaded from environment variables
//! - **oauth**: `TokenIssuerConfig` passed explicitly to the issuer and assertion verifier

/// Environment and server configuration
pub mod environment;
/// Token issuer configuration
pub mod oauth;

pub use environment::ServerConfig;
pub use oauth::TokenIssuerConfig;
