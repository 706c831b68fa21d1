// ABOUTME: Client authentication against the registry with Argon2 secret verification
// ABOUTME: Also checks requested audiences against the client's registered audiences
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::errors::GrantError;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::Client;
use crate::stores::ClientRegistry;

/// Authenticates confidential clients at the token endpoint
#[derive(Clone)]
pub struct ClientAuthenticator {
    registry: Arc<dyn ClientRegistry>,
}

impl ClientAuthenticator {
    /// Create an authenticator over a client registry
    #[must_use]
    pub fn new(registry: Arc<dyn ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Look up the client and verify its secret
    ///
    /// Unknown clients and wrong secrets both surface as `InvalidClient`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` on authentication failure and `StoreUnavailable`
    /// if the registry fails
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Client, GrantError> {
        tracing::debug!(client_id = %client_id, "Validating OAuth client");

        let Some(client) = self.registry.get_client(client_id).await? else {
            tracing::warn!(client_id = %client_id, "OAuth client not found");
            return Err(GrantError::InvalidClient);
        };

        verify_client_secret(client_id, client_secret, &client.client_secret_hash)?;

        tracing::debug!(client_id = %client_id, "OAuth client validated");
        Ok(client)
    }
}

/// Verify a client secret against its stored Argon2 hash
fn verify_client_secret(
    client_id: &str,
    client_secret: &str,
    client_secret_hash: &str,
) -> Result<(), GrantError> {
    let parsed_hash = PasswordHash::new(client_secret_hash).map_err(|e| {
        tracing::error!(client_id = %client_id, "Failed to parse stored secret hash: {e}");
        GrantError::InvalidClient
    })?;

    if Argon2::default()
        .verify_password(client_secret.as_bytes(), &parsed_hash)
        .is_err()
    {
        AppLogger::log_security_event(
            "client_secret_mismatch",
            "medium",
            "Client presented an invalid secret",
            Some(client_id),
        );
        return Err(GrantError::InvalidClient);
    }
    Ok(())
}

/// Hash a client secret for storage using Argon2id with a random salt
///
/// # Errors
///
/// Returns an error if Argon2 hashing fails
pub fn hash_client_secret(secret: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::crypto(format!("Argon2 password hashing failed: {e}")))
}

/// Check space-separated requested audiences against the client's registration
///
/// # Errors
///
/// Returns `InvalidRequest` naming the first audience the client did not register
pub fn check_requested_audiences(client: &Client, audience: Option<&str>) -> Result<(), GrantError> {
    for requested in audience.unwrap_or_default().split_whitespace() {
        if !client.allows_audience(requested) {
            return Err(GrantError::InvalidRequest(format!(
                "audience {requested} is not registered for this client"
            )));
        }
    }
    Ok(())
}
