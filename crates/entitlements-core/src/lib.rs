// ABOUTME: Core types and algorithms for the OAuth2 entitlement token server
// ABOUTME: Foundation crate with error handling, constants, models, and permission intersection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Entitlements Core
//!
//! Foundation crate for the entitlement token server. Everything here is pure:
//! no I/O, no async, no global state. The server crate wires these types to the
//! external stores and to the signing key.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Grant identifiers, scope keywords, claim names
//! - **models**: Clients, users, teams, and impersonation subjects
//! - **permissions**: Scope matching, self-scope translation, and entitlement computation

/// Unified error handling system with standard error codes
pub mod errors;

/// Protocol constants organized by domain
pub mod constants;

/// Core data models (Client, User, Team, Subject)
pub mod models;

/// Permission model, scope translation, and entitlement computation
pub mod permissions;
