// ABOUTME: Failure kinds of a token request and their OAuth 2.0 error mapping
// ABOUTME: Every failure aborts the request before anything is signed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use axum::http::StatusCode;
use thiserror::Error;

use super::models::OAuth2Error;
use crate::errors::AppError;
use crate::models::SubjectError;

/// Why a token request was refused
#[derive(Debug, Error)]
pub enum GrantError {
    /// Unknown client or wrong secret
    #[error("client authentication failed")]
    InvalidClient,
    /// Malformed or inconsistent request parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Grant identifier this server does not implement
    #[error("unsupported grant type '{0}'")]
    UnsupportedGrantType(String),
    /// Client is not registered for the requested grant
    #[error("client is not allowed to use grant type '{0}'")]
    UnauthorizedClient(String),
    /// JWT-bearer assertion missing or failed verification
    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),
    /// Assertion subject is not `user:id:<n>`
    #[error("invalid subject: {0}")]
    InvalidSubject(#[from] SubjectError),
    /// Client has no impersonation permissions
    #[error("client is not allowed to impersonate users")]
    ImpersonationNotAllowed,
    /// Assertion subject does not exist
    #[error("subject not found")]
    SubjectNotFound,
    /// A collaborator store failed
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] AppError),
    /// Token could not be signed
    #[error("signing failed: {0}")]
    SigningFailure(String),
}

impl GrantError {
    /// OAuth 2.0 error code for this failure
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidClient => "invalid_client",
            Self::InvalidRequest(_) => "invalid_request",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::UnauthorizedClient(_) => "unauthorized_client",
            Self::InvalidAssertion(_)
            | Self::InvalidSubject(_)
            | Self::ImpersonationNotAllowed
            | Self::SubjectNotFound => "invalid_grant",
            Self::StoreUnavailable(_) | Self::SigningFailure(_) => "server_error",
        }
    }

    /// HTTP status for this failure
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidClient => StatusCode::UNAUTHORIZED,
            Self::StoreUnavailable(_) | Self::SigningFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<AppError> for GrantError {
    fn from(error: AppError) -> Self {
        Self::StoreUnavailable(error)
    }
}

impl From<GrantError> for OAuth2Error {
    fn from(error: GrantError) -> Self {
        match error {
            GrantError::InvalidClient => Self::invalid_client(),
            GrantError::InvalidRequest(description) => Self::invalid_request(&description),
            GrantError::UnsupportedGrantType(_) => Self::unsupported_grant_type(),
            GrantError::UnauthorizedClient(grant_type) => Self::unauthorized_client(&format!(
                "Client is not registered for grant type {grant_type}"
            )),
            GrantError::InvalidAssertion(_) => Self::invalid_grant("Invalid assertion"),
            GrantError::InvalidSubject(_) => Self::invalid_grant("Invalid assertion subject"),
            GrantError::ImpersonationNotAllowed => {
                Self::invalid_grant("Client is not allowed to impersonate users")
            }
            GrantError::SubjectNotFound => Self::invalid_grant("Subject not found"),
            GrantError::StoreUnavailable(_) | GrantError::SigningFailure(_) => {
                Self::server_error()
            }
        }
    }
}
