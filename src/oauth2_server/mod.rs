// ABOUTME: OAuth 2.0 token issuance for client-credentials and JWT-bearer grants
// ABOUTME: Client authentication, assertion checks, grant handling, claims, and RS256 signing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// RFC 7523 assertion verification
pub mod assertion;
/// Scope-dependent claims
pub mod claims;
/// Client authentication
pub mod client_auth;
/// Token endpoint
pub mod endpoints;
/// Grant failure kinds
pub mod errors;
/// Grant handlers
pub mod grants;
/// Access token signing
pub mod issuer;
/// OAuth 2.0 data models and types
pub mod models;
/// Typestate pattern for compile-time token flow safety
pub mod typestate;

pub use assertion::{AssertionVerifier, VerifiedAssertion};
pub use claims::{build_extra_claims, ClaimsSource, ExtraClaims, RequestedScopes};
pub use client_auth::{check_requested_audiences, hash_client_secret, ClientAuthenticator};
pub use endpoints::TokenEndpoint;
pub use errors::GrantError;
pub use grants::GrantHandlers;
pub use issuer::{AccessTokenClaims, TokenGrant, TokenIssuer};
pub use models::{GrantType, OAuth2Error, TokenRequest, TokenResponse};

// Token flow typestate
/// Client authenticated and grant type parsed
pub use typestate::Dispatched;
/// Client registered for the grant
pub use typestate::GrantValidated;
/// Subject and audiences known
pub use typestate::SubjectResolved;
/// Extra claims built
pub use typestate::ClaimsPopulated;
/// Token signed
pub use typestate::Signed;
/// Token request with compile-time state transitions
pub use typestate::TokenFlow;
