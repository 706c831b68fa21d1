// ABOUTME: OAuth 2.0 token endpoint and JWKS route handlers
// ABOUTME: Decodes form-encoded token requests and publishes the signing key as a JWK set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! OAuth 2.0 routes for the token server

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};

use crate::constants::routes;
use crate::keys::JsonWebKeySet;
use crate::oauth2_server::{OAuth2Error, TokenEndpoint, TokenRequest};

/// `OAuth2` routes implementation
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all `OAuth2` routes
    pub fn routes(endpoint: Arc<TokenEndpoint>) -> Router {
        Router::new()
            .route(routes::TOKEN, post(Self::handle_token))
            .route(routes::JWKS, get(Self::handle_jwks))
            .with_state(endpoint)
    }

    /// Handle a token request (RFC 6749 section 4.4, RFC 7523 section 2.1)
    async fn handle_token(
        State(endpoint): State<Arc<TokenEndpoint>>,
        form: Result<Form<TokenRequest>, FormRejection>,
    ) -> Response {
        let Form(request) = match form {
            Ok(form) => form,
            Err(rejection) => {
                tracing::debug!("Rejected malformed token request: {rejection}");
                return OAuth2Error::invalid_request("Malformed token request").into_response();
            }
        };

        match endpoint.token(request).await {
            Ok(response) => response.into_response(),
            Err(error) => error.into_response(),
        }
    }

    /// Publish the token signing key
    async fn handle_jwks(State(endpoint): State<Arc<TokenEndpoint>>) -> Json<JsonWebKeySet> {
        Json(endpoint.issuer().signing_key().jwks())
    }
}
