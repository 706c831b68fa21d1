// ABOUTME: Integration tests for the client-credentials grant through the token endpoint
// ABOUTME: Covers service-account claims, entitlement filtering, and client authentication errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    decode_access_token, endpoint_with_store, store_with_client, test_client, test_endpoint,
    CLIENT_AUDIENCE, CLIENT_ID, CLIENT_SECRET,
};
use oauth2_entitlements::oauth2_server::TokenRequest;
use oauth2_entitlements::permissions::Permission;
use serde_json::{json, Value};

fn client_credentials_request(scope: &str) -> TokenRequest {
    TokenRequest {
        grant_type: "client_credentials".to_owned(),
        client_id: CLIENT_ID.to_owned(),
        client_secret: CLIENT_SECRET.to_owned(),
        scope: Some(scope.to_owned()),
        audience: Some(CLIENT_AUDIENCE.to_owned()),
        assertion: None,
    }
}

fn dashboards_client() -> oauth2_entitlements::models::Client {
    let mut client = test_client();
    client.self_permissions = vec![
        Permission::new("dashboards:read", "dashboards:*"),
        Permission::new("dashboards:read", "folders:*"),
        Permission::new("dashboards:write", "dashboards:uid:1"),
    ];
    client
}

#[tokio::test]
async fn test_client_credentials_issues_service_account_token() {
    let response = test_endpoint()
        .token(client_credentials_request("profile email groups entitlements"))
        .await
        .unwrap();

    assert_eq!(response.token_type, "bearer");
    assert_eq!(response.expires_in, 3600);
    assert_eq!(
        response.scope.as_deref(),
        Some("profile email groups entitlements")
    );

    let claims = decode_access_token(&response.access_token);
    assert_eq!(claims.sub, "user:id:2");
    assert_eq!(claims.iss, "test");
    assert_eq!(claims.aud, vec![CLIENT_AUDIENCE]);
    assert_eq!(claims.client_id, CLIENT_ID);
    assert!(!claims.jti.is_empty());
    assert_eq!(
        Value::Object(claims.extra),
        json!({
            "name": "testapp",
            "login": "testapp",
            "entitlements": { "users:impersonate": ["users:*"] },
        })
    );
}

#[tokio::test]
async fn test_entitlements_mirror_self_permissions() {
    let response = endpoint_with_store(store_with_client(dashboards_client()))
        .token(client_credentials_request("entitlements"))
        .await
        .unwrap();

    let claims = decode_access_token(&response.access_token);
    assert_eq!(
        claims.extra.get("entitlements"),
        Some(&json!({
            "dashboards:read": ["dashboards:*", "folders:*"],
            "dashboards:write": ["dashboards:uid:1"],
        }))
    );
}

#[tokio::test]
async fn test_entitlements_restricted_to_requested_action() {
    let response = endpoint_with_store(store_with_client(dashboards_client()))
        .token(client_credentials_request("entitlements dashboards:write"))
        .await
        .unwrap();

    let claims = decode_access_token(&response.access_token);
    assert_eq!(
        claims.extra.get("entitlements"),
        Some(&json!({ "dashboards:write": ["dashboards:uid:1"] }))
    );
}

#[tokio::test]
async fn test_entitlements_present_when_client_has_no_permissions() {
    let mut client = test_client();
    client.self_permissions = Vec::new();
    let response = endpoint_with_store(store_with_client(client))
        .token(client_credentials_request("entitlements"))
        .await
        .unwrap();

    let claims = decode_access_token(&response.access_token);
    assert_eq!(claims.extra.get("entitlements"), Some(&json!({})));
}

#[tokio::test]
async fn test_action_scope_alone_adds_no_claims() {
    let response = endpoint_with_store(store_with_client(dashboards_client()))
        .token(client_credentials_request("dashboards:write"))
        .await
        .unwrap();
    assert!(decode_access_token(&response.access_token).extra.is_empty());
    assert_eq!(response.scope.as_deref(), Some("dashboards:write"));
}

#[tokio::test]
async fn test_duplicate_scopes_collapsed() {
    let response = test_endpoint()
        .token(client_credentials_request("profile profile"))
        .await
        .unwrap();
    assert_eq!(response.scope.as_deref(), Some("profile"));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_wrong_secret_rejected() {
    let mut request = client_credentials_request("profile");
    request.client_secret = "not-the-secret".to_owned();
    let error = test_endpoint().token(request).await.unwrap_err();
    assert_eq!(error.error, "invalid_client");
}

#[tokio::test]
async fn test_unknown_client_rejected() {
    let mut request = client_credentials_request("profile");
    request.client_id = "unknown".to_owned();
    let error = test_endpoint().token(request).await.unwrap_err();
    assert_eq!(error.error, "invalid_client");
}

#[tokio::test]
async fn test_unregistered_grant_rejected() {
    let mut client = test_client();
    client.grant_types = vec!["urn:ietf:params:oauth:grant-type:jwt-bearer".to_owned()];
    let error = endpoint_with_store(store_with_client(client))
        .token(client_credentials_request("profile"))
        .await
        .unwrap_err();
    assert_eq!(error.error, "unauthorized_client");
}

#[tokio::test]
async fn test_unsupported_grant_rejected() {
    let mut request = client_credentials_request("profile");
    request.grant_type = "authorization_code".to_owned();
    let error = test_endpoint().token(request).await.unwrap_err();
    assert_eq!(error.error, "unsupported_grant_type");
}

#[tokio::test]
async fn test_unregistered_audience_rejected() {
    let mut request = client_credentials_request("profile");
    request.audience = Some("https://evil.test/".to_owned());
    let error = test_endpoint().token(request).await.unwrap_err();
    assert_eq!(error.error, "invalid_request");
}
