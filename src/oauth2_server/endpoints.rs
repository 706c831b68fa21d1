// ABOUTME: OAuth 2.0 token endpoint dispatching client-credentials and JWT-bearer grants
// ABOUTME: Authenticates the client, runs the grant handler, and signs the access token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use super::assertion::AssertionVerifier;
use super::claims::RequestedScopes;
use super::client_auth::{check_requested_audiences, ClientAuthenticator};
use super::errors::GrantError;
use super::grants::GrantHandlers;
use super::issuer::TokenIssuer;
use super::models::{GrantType, OAuth2Error, TokenRequest, TokenResponse};
use super::typestate::TokenFlow;
use crate::config::TokenIssuerConfig;
use crate::keys::SigningKey;
use crate::logging::AppLogger;
use crate::stores::Stores;

/// OAuth 2.0 token endpoint
#[derive(Clone)]
pub struct TokenEndpoint {
    authenticator: ClientAuthenticator,
    grants: GrantHandlers,
    issuer: TokenIssuer,
}

impl TokenEndpoint {
    /// Wire the endpoint from stores, issuer settings, and the signing key
    #[must_use]
    pub fn new(stores: Stores, config: TokenIssuerConfig, key: Arc<SigningKey>) -> Self {
        let assertions = AssertionVerifier::new(
            stores.keys.clone(),
            config.token_endpoint(),
            config.assertion_leeway,
        );
        Self {
            authenticator: ClientAuthenticator::new(stores.clients.clone()),
            grants: GrantHandlers::new(stores, assertions),
            issuer: TokenIssuer::new(config, key),
        }
    }

    /// Token issuer
    #[must_use]
    pub const fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Handle a token request (POST /oauth2/token)
    ///
    /// # Errors
    ///
    /// Returns an RFC 6749 error response for any refused request; nothing is
    /// signed unless every step succeeds
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        match self.issue(&request).await {
            Ok(response) => Ok(response),
            Err(error) => {
                AppLogger::log_grant_rejected(
                    &request.client_id,
                    &request.grant_type,
                    error.error_code(),
                    &error.to_string(),
                );
                Err(error.into())
            }
        }
    }

    async fn issue(&self, request: &TokenRequest) -> Result<TokenResponse, GrantError> {
        let client = self
            .authenticator
            .authenticate(&request.client_id, &request.client_secret)
            .await?;

        let grant = GrantType::parse(&request.grant_type)
            .ok_or_else(|| GrantError::UnsupportedGrantType(request.grant_type.clone()))?;

        check_requested_audiences(&client, request.audience.as_deref())?;

        let scopes = RequestedScopes::parse(request.scope.as_deref());
        let flow = TokenFlow::dispatch(client, grant, scopes).validate_grant()?;

        let populated = match grant {
            GrantType::ClientCredentials => GrantHandlers::client_credentials(flow),
            GrantType::JwtBearer => {
                self.grants
                    .jwt_bearer(flow, request.assertion.as_deref())
                    .await?
            }
        };

        let signed = populated.sign(&self.issuer)?;
        let subject = signed.subject().to_string();
        let entitlement_actions = signed.entitlement_actions();
        let response = signed.into_response();

        AppLogger::log_token_issued(
            &request.client_id,
            grant.as_str(),
            &subject,
            response.scope.as_deref(),
            entitlement_actions,
        );
        Ok(response)
    }
}
