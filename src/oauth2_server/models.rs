// ABOUTME: OAuth 2.0 token endpoint request, response, and error structures
// ABOUTME: Implements RFC 6749 section 5 payloads for client-credentials and JWT-bearer grants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::fmt;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::constants::grant_types;

/// Grant types this server can issue tokens for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    /// Client acts as its own service account
    ClientCredentials,
    /// Client impersonates the subject of a signed assertion
    JwtBearer,
}

impl GrantType {
    /// Parse a `grant_type` form value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            grant_types::CLIENT_CREDENTIALS => Some(Self::ClientCredentials),
            grant_types::JWT_BEARER => Some(Self::JwtBearer),
            _ => None,
        }
    }

    /// Wire identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientCredentials => grant_types::CLIENT_CREDENTIALS,
            Self::JwtBearer => grant_types::JWT_BEARER,
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth 2.0 Token Request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenRequest {
    /// Grant type (`client_credentials` or the JWT-bearer URN)
    pub grant_type: String,
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Space-separated requested scopes
    #[serde(default)]
    pub scope: Option<String>,
    /// Space-separated requested audiences
    #[serde(default)]
    pub audience: Option<String>,
    /// Signed JWT naming the subject to impersonate (JWT-bearer only)
    #[serde(default)]
    pub assertion: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token (JWT)
    pub access_token: String,
    /// Token type (always "bearer")
    pub token_type: String,
    /// Expires in seconds
    pub expires_in: i64,
    /// Scopes granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self)).into_response();
        // RFC 6749 section 5.1
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
            .headers_mut()
            .insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        response
    }
}

const RFC6749_SECTION_5_2: &str = "https://datatracker.ietf.org/doc/html/rfc6749#section-5.2";

/// OAuth 2.0 Error Response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Human-readable error description
    pub error_description: Option<String>,
    /// URI for error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl OAuth2Error {
    fn with_code(error: &str, description: &str) -> Self {
        Self {
            error: error.to_owned(),
            error_description: Some(description.to_owned()),
            error_uri: Some(RFC6749_SECTION_5_2.to_owned()),
        }
    }

    /// Create an `invalid_request` error
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self::with_code("invalid_request", description)
    }

    /// Create an `invalid_client` error
    #[must_use]
    pub fn invalid_client() -> Self {
        Self::with_code("invalid_client", "Client authentication failed")
    }

    /// Create an `invalid_grant` error
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self::with_code("invalid_grant", description)
    }

    /// Create an `unsupported_grant_type` error
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::with_code("unsupported_grant_type", "Grant type not supported")
    }

    /// Create an `unauthorized_client` error
    /// Used when a client attempts to use a `grant_type` it was not registered for
    #[must_use]
    pub fn unauthorized_client(description: &str) -> Self {
        Self::with_code("unauthorized_client", description)
    }

    /// Create a `server_error` error
    ///
    /// The description is fixed so store or key details never reach the client.
    #[must_use]
    pub fn server_error() -> Self {
        Self {
            error: "server_error".to_owned(),
            error_description: Some("The server could not complete the token request".to_owned()),
            error_uri: None,
        }
    }

    /// HTTP status for this error per RFC 6749 section 5.2
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.error.as_str() {
            "invalid_client" => StatusCode::UNAUTHORIZED,
            "server_error" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for OAuth2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {description}", self.error),
            None => f.write_str(&self.error),
        }
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self)).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"oauth2\""),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_type_parse() {
        assert_eq!(
            GrantType::parse("client_credentials"),
            Some(GrantType::ClientCredentials)
        );
        assert_eq!(
            GrantType::parse("urn:ietf:params:oauth:grant-type:jwt-bearer"),
            Some(GrantType::JwtBearer)
        );
        assert_eq!(GrantType::parse("authorization_code"), None);
        assert_eq!(GrantType::parse("refresh_token"), None);
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            OAuth2Error::invalid_client().status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            OAuth2Error::invalid_grant("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            OAuth2Error::server_error().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_response_omits_empty_scope() {
        let response = TokenResponse {
            access_token: "abc".to_owned(),
            token_type: "bearer".to_owned(),
            expires_in: 3600,
            scope: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("scope").is_none());
    }
}
