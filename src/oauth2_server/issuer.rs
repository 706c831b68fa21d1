// ABOUTME: Signs access tokens with the server RSA key (RS256, typ at+jwt)
// ABOUTME: Adds standard claims around the scope-dependent extra claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::claims::ExtraClaims;
use super::errors::GrantError;
use super::models::TokenResponse;
use crate::config::TokenIssuerConfig;
use crate::constants::tokens;
use crate::keys::SigningKey;
use crate::models::Subject;

/// Claims of an issued access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// `user:id:<n>`
    pub sub: String,
    /// Issuer URL
    pub iss: String,
    /// Audiences the token is valid for
    pub aud: Vec<String>,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Unique token ID
    pub jti: String,
    /// Client the token was issued to
    pub client_id: String,
    /// Scope-dependent claims
    #[serde(flatten)]
    pub extra: ExtraClaims,
}

/// What the issuer needs to mint one token
#[derive(Debug)]
pub struct TokenGrant<'a> {
    /// Client the token is issued to
    pub client_id: &'a str,
    /// Token subject
    pub subject: Subject,
    /// `aud` values
    pub audiences: Vec<String>,
    /// Scope-dependent claims
    pub extra: ExtraClaims,
    /// Granted scope string for the response
    pub scope: Option<String>,
}

/// Mints RS256 access tokens
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: TokenIssuerConfig,
    key: Arc<SigningKey>,
}

impl TokenIssuer {
    /// Create an issuer over explicit configuration and key
    #[must_use]
    pub const fn new(config: TokenIssuerConfig, key: Arc<SigningKey>) -> Self {
        Self { config, key }
    }

    /// Issuer configuration
    #[must_use]
    pub const fn config(&self) -> &TokenIssuerConfig {
        &self.config
    }

    /// Signing key
    #[must_use]
    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// Sign an access token and build the token response
    ///
    /// # Errors
    ///
    /// Returns `SigningFailure` if the token cannot be encoded or signed
    pub fn issue(&self, grant: TokenGrant<'_>) -> Result<TokenResponse, GrantError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.config.access_token_ttl)
            .ok_or_else(|| {
                GrantError::SigningFailure("access token expiry out of range".to_owned())
            })?;
        let claims = AccessTokenClaims {
            sub: grant.subject.to_string(),
            iss: self.config.issuer.clone(),
            aud: grant.audiences,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            client_id: grant.client_id.to_owned(),
            extra: grant.extra,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some(tokens::ACCESS_TOKEN_TYPE.to_owned());
        header.kid = Some(self.key.kid().to_owned());

        let access_token = encode(&header, &claims, self.key.encoding_key()).map_err(|e| {
            tracing::error!(client_id = %grant.client_id, "Failed to sign access token: {e}");
            GrantError::SigningFailure(e.to_string())
        })?;

        tracing::debug!(
            client_id = %grant.client_id,
            subject = %claims.sub,
            jti = %claims.jti,
            "Access token signed"
        );

        Ok(TokenResponse {
            access_token,
            token_type: tokens::BEARER.to_owned(),
            expires_in: self.config.access_token_ttl.num_seconds(),
            scope: grant.scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, Validation};
    use serde_json::{json, Value};

    const SIGNING_KEY: &str = include_str!("../../tests/fixtures/signing_key.pem");

    fn issuer() -> TokenIssuer {
        let key = SigningKey::from_pkcs8_pem("test-kid", SIGNING_KEY).unwrap();
        TokenIssuer::new(TokenIssuerConfig::for_issuer("test"), Arc::new(key))
    }

    fn grant(extra: ExtraClaims) -> TokenGrant<'static> {
        TokenGrant {
            client_id: "my-client",
            subject: Subject::for_user(2),
            audiences: vec!["https://oauth.test/".to_owned()],
            extra,
            scope: Some("profile".to_owned()),
        }
    }

    #[test]
    fn test_header_declares_access_token() {
        let response = issuer().issue(grant(ExtraClaims::new())).unwrap();
        let header = decode_header(&response.access_token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.typ.as_deref(), Some("at+jwt"));
        assert_eq!(header.kid.as_deref(), Some("test-kid"));
        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.scope.as_deref(), Some("profile"));
    }

    #[test]
    fn test_signed_claims_round_trip() {
        let issuer = issuer();
        let mut extra = ExtraClaims::new();
        extra.insert("name".to_owned(), json!("Test App"));
        extra.insert("entitlements".to_owned(), json!({}));
        let response = issuer.issue(grant(extra.clone())).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth.test/"]);
        validation.set_issuer(&["test"]);
        let claims = decode::<AccessTokenClaims>(
            &response.access_token,
            issuer.signing_key().decoding_key(),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(claims.sub, "user:id:2");
        assert_eq!(claims.client_id, "my-client");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.jti.is_empty());
        assert_eq!(claims.extra, extra);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let issuer = issuer();
        let first = issuer.issue(grant(ExtraClaims::new())).unwrap();
        let second = issuer.issue(grant(ExtraClaims::new())).unwrap();
        let jti = |token: &str| -> Value {
            let mut validation = Validation::new(Algorithm::RS256);
            validation.validate_aud = false;
            decode::<Value>(token, issuer.signing_key().decoding_key(), &validation)
                .unwrap()
                .claims["jti"]
                .clone()
        };
        assert_ne!(jti(&first.access_token), jti(&second.access_token));
    }

    #[test]
    fn test_expiry_overflow_is_signing_failure() {
        let key = SigningKey::from_pkcs8_pem("test-kid", SIGNING_KEY).unwrap();
        let mut config = TokenIssuerConfig::for_issuer("test");
        config.access_token_ttl = chrono::Duration::try_days(1_000_000_000).unwrap();
        let issuer = TokenIssuer::new(config, Arc::new(key));

        let result = issuer.issue(grant(ExtraClaims::new()));
        assert!(matches!(result, Err(GrantError::SigningFailure(_))));
    }
}
