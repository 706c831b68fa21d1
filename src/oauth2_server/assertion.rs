// ABOUTME: JWT-bearer assertion verification (RFC 7523) with the client's registered key
// ABOUTME: Checks signature, issuer, audience, expiry, and required claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer};

use super::errors::GrantError;
use crate::stores::KeyStore;

/// `aud` may be a single string or an array
#[derive(Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[derive(Debug, Clone, Deserialize)]
struct AssertionClaims {
    sub: String,
    #[serde(deserialize_with = "one_or_many")]
    aud: Vec<String>,
    #[serde(default)]
    jti: Option<String>,
}

/// Claims of a verified assertion the grant handler needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAssertion {
    /// Raw `sub` value, parsed later by the grant handler
    pub subject: String,
    /// `aud` values, carried into the issued token
    pub audiences: Vec<String>,
    /// Assertion identifier
    pub jti: String,
}

/// Verifies JWT-bearer assertions presented by clients
#[derive(Clone)]
pub struct AssertionVerifier {
    keys: Arc<dyn KeyStore>,
    token_endpoint: String,
    leeway: u64,
}

impl AssertionVerifier {
    /// Create a verifier accepting assertions addressed to `token_endpoint`
    #[must_use]
    pub fn new(keys: Arc<dyn KeyStore>, token_endpoint: impl Into<String>, leeway: u64) -> Self {
        Self {
            keys,
            token_endpoint: token_endpoint.into(),
            leeway,
        }
    }

    /// Verify an assertion signed by `client_id`
    ///
    /// The assertion must be RS256-signed with the client's registered key, name
    /// the client as `iss`, include the token endpoint in `aud`, be unexpired
    /// within the configured leeway, and carry `sub` and `jti`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAssertion` for any verification failure or a missing key,
    /// and `StoreUnavailable` if the key store fails
    pub async fn verify(
        &self,
        client_id: &str,
        assertion: &str,
    ) -> Result<VerifiedAssertion, GrantError> {
        let public_key_pem = self
            .keys
            .get_client_public_key(client_id)
            .await?
            .ok_or_else(|| {
                GrantError::InvalidAssertion("no public key registered for client".to_owned())
            })?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes()).map_err(|e| {
            tracing::error!(client_id = %client_id, "Registered client key is unusable: {e}");
            GrantError::InvalidAssertion("registered client key is unusable".to_owned())
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway;
        validation.set_issuer(&[client_id]);
        validation.set_audience(&[self.token_endpoint.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<AssertionClaims>(assertion, &decoding_key, &validation)
            .map_err(|e| {
                tracing::warn!(client_id = %client_id, "Assertion rejected: {e}");
                GrantError::InvalidAssertion(e.to_string())
            })?
            .claims;

        let jti = claims
            .jti
            .filter(|jti| !jti.is_empty())
            .ok_or_else(|| GrantError::InvalidAssertion("missing jti claim".to_owned()))?;

        tracing::debug!(client_id = %client_id, jti = %jti, "Assertion verified");
        Ok(VerifiedAssertion {
            subject: claims.sub,
            audiences: claims.aud,
            jti,
        })
    }
}
