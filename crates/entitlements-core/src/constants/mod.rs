// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Grant identifiers, scope keywords, claim names, and server defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants module
//!
//! Protocol identifiers and defaults grouped by domain.

/// OAuth 2.0 grant type identifiers
pub mod grant_types {
    /// RFC 6749 section 4.4
    pub const CLIENT_CREDENTIALS: &str = "client_credentials";
    /// RFC 7523 section 2.1
    pub const JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
}

/// Scope keywords that select which extra claims land in the token
pub mod scope_keywords {
    /// Display name, login, and last update time
    pub const PROFILE: &str = "profile";
    /// Email address
    pub const EMAIL: &str = "email";
    /// Team names
    pub const GROUPS: &str = "groups";
    /// Narrowed permission map
    pub const ENTITLEMENTS: &str = "entitlements";
}

/// Self-referencing scope templates resolved against the impersonated subject
pub mod self_scopes {
    /// Resolves to `global.users:id:<user id>`
    pub const GLOBAL_USERS_SELF: &str = "global.users:self";
    /// Resolves to `users:id:<user id>`
    pub const USERS_SELF: &str = "users:self";
    /// Resolves to one `teams:id:<team id>` per team
    pub const TEAMS_SELF: &str = "teams:self";

    /// Prefix for a resolved global user scope
    pub const GLOBAL_USERS_ID_PREFIX: &str = "global.users:id:";
    /// Prefix for a resolved user scope
    pub const USERS_ID_PREFIX: &str = "users:id:";
    /// Prefix for a resolved team scope
    pub const TEAMS_ID_PREFIX: &str = "teams:id:";
}

/// Scope pattern syntax
pub mod scope_syntax {
    /// Separator between scope segments
    pub const SEPARATOR: char = ':';
    /// Wildcard suffix matching any remainder
    pub const WILDCARD: char = '*';
}

/// Claim names written into access tokens
pub mod claims {
    /// Client that requested the token
    pub const CLIENT_ID: &str = "client_id";
    /// Display name
    pub const NAME: &str = "name";
    /// Login handle
    pub const LOGIN: &str = "login";
    /// Unix seconds of the last profile update
    pub const UPDATED_AT: &str = "updated_at";
    /// Email address
    pub const EMAIL: &str = "email";
    /// Team names
    pub const GROUPS: &str = "groups";
    /// Action to scope list map
    pub const ENTITLEMENTS: &str = "entitlements";
}

/// Token format values
pub mod tokens {
    /// JWT `typ` header for access tokens (RFC 9068)
    pub const ACCESS_TOKEN_TYPE: &str = "at+jwt";
    /// `token_type` in the token response
    pub const BEARER: &str = "bearer";
    /// Subject prefix for user identities
    pub const SUBJECT_PREFIX: &str = "user:id:";
}

/// HTTP routes
pub mod routes {
    /// Token endpoint
    pub const TOKEN: &str = "/oauth2/token";
    /// Public key set
    pub const JWKS: &str = "/.well-known/jwks.json";
    /// Health route
    pub const HEALTH: &str = "/health";
}

/// Server defaults
pub mod defaults {
    /// Default HTTP port
    pub const HTTP_PORT: u16 = 8081;
    /// Access token lifetime in seconds
    pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;
    /// Longest access token lifetime accepted from configuration
    pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 86_400;
    /// Clock skew allowed when validating assertion expiry
    pub const ASSERTION_LEEWAY_SECS: u64 = 60;
    /// RSA modulus size for generated signing keys
    pub const RSA_KEY_SIZE: usize = 4096;
    /// Key identifier for a generated signing key
    pub const SIGNING_KEY_ID: &str = "oauth2-signing-key";
}
