// ABOUTME: Main library entry point for the OAuth 2.0 entitlement token server
// ABOUTME: Issues RS256 access tokens carrying narrowed, delegated permissions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # OAuth2 Entitlements
//!
//! An OAuth 2.0 token endpoint that decides what an access token may assert
//! about its bearer. Two grants are supported:
//!
//! - **client-credentials**: a registered client acts as its own service account
//! - **JWT-bearer** (RFC 7523): a registered client impersonates an end user
//!
//! Every token can carry an `entitlements` claim: the client's delegation set
//! intersected with what the subject actually holds, narrowed per action.
//!
//! ## Architecture
//!
//! - **stores**: Collaborator traits for clients, keys, users, teams, and permissions
//! - **`oauth2_server`**: Client authentication, grant handlers, claims, and signing
//! - **keys**: RSA signing key and JWKS publication
//! - **routes**: Axum routes for the token endpoint and key set
//! - **config**: Environment configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use oauth2_entitlements::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Token issuer: {}", config.issuer.issuer);
//!     Ok(())
//! }
//! ```

/// Environment configuration and token issuer settings
pub mod config;

/// Unified error handling re-exported from the core crate
pub mod errors;

/// RSA signing key management and JWKS
pub mod keys;

/// Structured logging setup
pub mod logging;

/// OAuth 2.0 token endpoint, grants, and issuance
pub mod oauth2_server;

/// Permission model re-exported from the core crate
pub mod permissions;

/// HTTP routes
pub mod routes;

/// Collaborator store interfaces and the in-memory implementation
pub mod stores;

pub use entitlements_core::{constants, models};
