// ABOUTME: Shared test utilities and fixtures for integration tests
// ABOUTME: Provides logging setup, fixture keys, seeded stores, and token helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `oauth2_entitlements`

use std::sync::{Arc, Once, OnceLock};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, EncodingKey, Header, Validation};
use oauth2_entitlements::{
    config::TokenIssuerConfig,
    errors::{AppError, AppResult},
    keys::SigningKey,
    models::{Client, ServiceIdentity, Team, User},
    oauth2_server::{hash_client_secret, AccessTokenClaims, TokenEndpoint},
    permissions::Permission,
    stores::{
        ClientRegistry, InMemoryStore, KeyStore, PermissionQuery, PermissionStore, Stores,
        TeamStore, UserStore,
    },
};
use serde_json::json;
use uuid::Uuid;

pub const SIGNING_KEY_PEM: &str = include_str!("fixtures/signing_key.pem");
pub const CLIENT_KEY_PEM: &str = include_str!("fixtures/client_assertion_key.pem");
pub const CLIENT_PUBLIC_KEY_PEM: &str = include_str!("fixtures/client_assertion_key.pub.pem");

pub const ISSUER: &str = "test";
pub const TOKEN_ENDPOINT: &str = "test/oauth2/token";
pub const CLIENT_ID: &str = "RANDOMID";
pub const CLIENT_SECRET: &str = "RANDOMSECRET";
pub const CLIENT_AUDIENCE: &str = "https://oauth.test/";
pub const SIGNING_KID: &str = "test-signing-key";
pub const JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const USER_ID: i64 = 56;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Argon2 hash of `CLIENT_SECRET`, computed once per test process
pub fn client_secret_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_client_secret(CLIENT_SECRET).unwrap())
        .clone()
}

/// Server signing key from the fixture
pub fn signing_key() -> Arc<SigningKey> {
    Arc::new(SigningKey::from_pkcs8_pem(SIGNING_KID, SIGNING_KEY_PEM).unwrap())
}

/// Client registered for both grants
///
/// Self permissions: `users:impersonate` on `users:*`. Impersonation set: the
/// three self templates plus folder and dashboard reads.
pub fn test_client() -> Client {
    Client {
        client_id: CLIENT_ID.to_owned(),
        client_secret_hash: client_secret_hash(),
        grant_types: vec!["client_credentials".to_owned(), JWT_BEARER.to_owned()],
        service_account: ServiceIdentity {
            user_id: 2,
            name: "testapp".to_owned(),
            login: "testapp".to_owned(),
        },
        self_permissions: vec![Permission::new("users:impersonate", "users:*")],
        impersonate_permissions: vec![
            Permission::new("users:read", "global.users:self"),
            Permission::new("users.permissions:read", "users:self"),
            Permission::new("teams:read", "teams:self"),
            Permission::new("folders:read", "folders:*"),
            Permission::new("dashboards:read", "folders:*"),
            Permission::new("dashboards:read", "dashboards:*"),
        ],
        audiences: vec![CLIENT_AUDIENCE.to_owned()],
    }
}

/// Impersonation target
pub fn user56() -> User {
    User {
        id: USER_ID,
        email: "user56@example.org".to_owned(),
        login: "user56".to_owned(),
        name: "User 56".to_owned(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
    }
}

pub fn team(id: i64) -> Team {
    Team {
        id,
        name: format!("Team {id}"),
    }
}

/// Permissions held directly by user 56
pub fn user56_permissions() -> Vec<Permission> {
    vec![
        Permission::new("users:read", "global.users:id:56"),
        Permission::new("folders:read", "folders:uid:UID1"),
        Permission::new("dashboards:read", "folders:uid:UID1"),
        Permission::new("datasources:read", "datasources:uid:DS_UID2"),
    ]
}

/// Store with `client`, its assertion key, user 56 in teams 1 and 2, and the
/// Viewer role; user 56 holds no direct permissions
pub fn store_with_client(client: Client) -> InMemoryStore {
    InMemoryStore::new()
        .with_client_key(&client.client_id, CLIENT_PUBLIC_KEY_PEM)
        .with_client(client)
        .with_user(user56())
        .with_team(team(1))
        .with_team(team(2))
        .with_team_member(1, USER_ID)
        .with_team_member(2, USER_ID)
        .with_role("Viewer", Vec::new())
        .with_user_role(USER_ID, "Viewer")
}

/// Default seeded store, user 56 holding `user56_permissions`
pub fn test_store() -> InMemoryStore {
    store_with_client(test_client()).with_user_permissions(USER_ID, user56_permissions())
}

/// Token endpoint over `store` with issuer `test`
pub fn endpoint_with_store(store: InMemoryStore) -> TokenEndpoint {
    endpoint_with_stores(Stores::from_shared(Arc::new(store)))
}

/// Token endpoint over an explicit store bundle with issuer `test`
pub fn endpoint_with_stores(stores: Stores) -> TokenEndpoint {
    init_test_logging();
    TokenEndpoint::new(stores, TokenIssuerConfig::for_issuer(ISSUER), signing_key())
}

/// Backend message carried by every `UnavailableStore` error
pub const STORE_FAILURE_MESSAGE: &str = "connection reset by db-primary:5432";

/// Store whose every lookup fails as an unreachable backend would
pub struct UnavailableStore;

fn unavailable<T>() -> AppResult<T> {
    Err(AppError::unavailable(STORE_FAILURE_MESSAGE))
}

#[async_trait]
impl ClientRegistry for UnavailableStore {
    async fn get_client(&self, _client_id: &str) -> AppResult<Option<Client>> {
        unavailable()
    }
}

#[async_trait]
impl KeyStore for UnavailableStore {
    async fn get_client_public_key(&self, _client_id: &str) -> AppResult<Option<String>> {
        unavailable()
    }
}

#[async_trait]
impl UserStore for UnavailableStore {
    async fn get_user_by_id(&self, _user_id: i64) -> AppResult<Option<User>> {
        unavailable()
    }
}

#[async_trait]
impl TeamStore for UnavailableStore {
    async fn get_teams_by_user(&self, _user_id: i64) -> AppResult<Vec<Team>> {
        unavailable()
    }
}

#[async_trait]
impl PermissionStore for UnavailableStore {
    async fn get_user_permissions(&self, _query: &PermissionQuery) -> AppResult<Vec<Permission>> {
        unavailable()
    }

    async fn get_user_roles(&self, _user_id: i64) -> AppResult<Vec<String>> {
        unavailable()
    }
}

/// Default seeded stores with `replace` applied to the bundle
pub fn stores_with(replace: impl FnOnce(&mut Stores)) -> Stores {
    let mut stores = Stores::from_shared(Arc::new(test_store()));
    replace(&mut stores);
    stores
}

/// Token endpoint over the default store
pub fn test_endpoint() -> TokenEndpoint {
    endpoint_with_store(test_store())
}

/// Sign a JWT-bearer assertion with the client fixture key
pub fn sign_assertion(issuer: &str, subject: &str, audiences: &[&str]) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "iss": issuer,
        "sub": subject,
        "aud": audiences,
        "exp": now + 300,
        "iat": now,
        "jti": Uuid::new_v4().to_string(),
    });
    let key = EncodingKey::from_rsa_pem(CLIENT_KEY_PEM.as_bytes()).unwrap();
    encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
}

/// Assertion for user 56 addressed to the test token endpoint
pub fn user56_assertion() -> String {
    sign_assertion(CLIENT_ID, "user:id:56", &[TOKEN_ENDPOINT])
}

/// Verify an access token with the fixture signing key
pub fn decode_access_token(token: &str) -> AccessTokenClaims {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_aud = false;
    decode::<AccessTokenClaims>(token, signing_key().decoding_key(), &validation)
        .unwrap()
        .claims
}
