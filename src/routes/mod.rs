// ABOUTME: Route module organization for the token server HTTP endpoints
// ABOUTME: Assembles health and OAuth 2.0 routes behind tracing and request-id middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Route module for the token server

/// Health check routes
pub mod health;
/// OAuth 2.0 token and JWKS routes
pub mod oauth2;

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use health::HealthRoutes;
pub use oauth2::OAuth2Routes;

use crate::oauth2_server::TokenEndpoint;

/// Largest accepted request body; token requests are small forms
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the complete application router
pub fn router(endpoint: Arc<TokenEndpoint>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(OAuth2Routes::routes(endpoint))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
}
